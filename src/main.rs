//! Remedy AI 命令行
//!
//! 用法：remedy-ai [--symptoms] [--config <path>] <描述…>
//! 默认生成疗法；--symptoms 时按单轮问诊做症状分析。Ctrl-C 取消在途的 Provider 调用并直接走兜底。

use std::path::PathBuf;

use anyhow::{bail, Context};
use tokio_util::sync::CancellationToken;

use remedy_ai::config::load_config;
use remedy_ai::remedy::{Message, RemedyRequest, SymptomQuery};
use remedy_ai::RemedyService;

struct CliArgs {
    symptoms: bool,
    config: Option<PathBuf>,
    preferences: Option<String>,
    text: String,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut symptoms = false;
    let mut config = None;
    let mut preferences = None;
    let mut words = Vec::new();
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--symptoms" => symptoms = true,
            "--config" => config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
            "--preferences" => preferences = Some(args.next().context("--preferences needs a value")?),
            _ => words.push(arg),
        }
    }
    let text = words.join(" ");
    if text.trim().is_empty() {
        bail!("usage: remedy-ai [--symptoms] [--config <path>] [--preferences <text>] <description...>");
    }
    Ok(CliArgs {
        symptoms,
        config,
        preferences,
        text,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    remedy_ai::observability::init();

    let args = parse_args(std::env::args().skip(1))?;
    let cfg = load_config(args.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });
    let service = RemedyService::from_config(cfg);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, finishing with fallback");
            ctrl_c.cancel();
        }
    });

    let output = if args.symptoms {
        let query = SymptomQuery::new(vec![Message::user(args.text)]);
        let reply = service.analyze_symptoms_with_cancel(&query, &cancel).await;
        serde_json::to_string_pretty(&reply)
    } else {
        let mut request = RemedyRequest::new(args.text);
        request.preferences = args.preferences;
        let reply = service.generate_remedy_with_cancel(&request, &cancel).await;
        serde_json::to_string_pretty(&reply)
    }
    .context("Failed to serialize reply")?;

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args_joins_words() {
        let parsed = parse_args(args(&["--symptoms", "bloated", "after", "dinner"])).unwrap();
        assert!(parsed.symptoms);
        assert_eq!(parsed.text, "bloated after dinner");
    }

    #[test]
    fn test_parse_args_requires_text() {
        assert!(parse_args(args(&["--symptoms"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
    }
}
