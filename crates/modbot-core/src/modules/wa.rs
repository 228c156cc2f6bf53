use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::{
    formatting::escape_html,
    module::{BotModule, MessageContext},
    ports::{KnowledgeEngine, Pod, QueryResult},
    Result,
};

pub const APP_ID_HINT: &str =
    "Please get and set a appid: https://products.wolframalpha.com/simple-api/documentation/";

/// A rendered answer: rich text plus its plain-text fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub plain: String,
}

impl Rendered {
    fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }
}

/// Knowledge-engine queries (`!wa <query>`, `!wafull <query>` for every pod).
pub struct WolframModule {
    engine: Arc<dyn KnowledgeEngine>,
    app_id: Mutex<String>,
}

impl WolframModule {
    pub fn new(engine: Arc<dyn KnowledgeEngine>) -> Self {
        Self {
            engine,
            app_id: Mutex::new(String::new()),
        }
    }

    async fn set_app_id(&self, ctx: &MessageContext<'_>, app_id: &str) -> Result<()> {
        ctx.bot.must_be_owner(ctx.event)?;
        *self.app_id.lock().await = app_id.to_string();
        ctx.bot.save_settings().await?;
        ctx.reply_text("App id set").await
    }
}

#[async_trait]
impl BotModule for WolframModule {
    fn name(&self) -> &str {
        "wa"
    }

    fn help(&self) -> String {
        "Wolfram Alpha search".to_string()
    }

    fn aliases(&self) -> Vec<String> {
        vec!["wafull".to_string()]
    }

    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()> {
        let args = ctx.args();
        if let [sub, app_id] = args.as_slice() {
            if sub == "appid" {
                return self.set_app_id(ctx, app_id).await;
            }
        }

        if args.is_empty() {
            let usage = format!("Usage: {}wa <query>", ctx.bot.prefix());
            return ctx.reply_text(&usage).await;
        }

        let app_id = self.app_id.lock().await.clone();
        if app_id.is_empty() {
            return ctx.reply_text(APP_ID_HINT).await;
        }

        let query = ctx.event.rest();
        let res = self.engine.query(&app_id, query).await?;
        if res.success {
            tracing::debug!(module = self.name(), room = %ctx.room.name, sender = %ctx.event.sender, "sent a valid query");
        } else {
            tracing::info!(module = self.name(), error = res.error.as_deref().unwrap_or("unknown"), "query failed");
        }

        let wants_full = ctx
            .event
            .command_token()
            .is_some_and(|token| token.contains("full"));
        let (short, full) = render_pods(&res);

        let answer = match short {
            _ if wants_full && !full.is_empty() => full,
            Some(short) => short,
            None => {
                let plain = format!("Could not find response for {query}");
                Rendered {
                    html: escape_html(&plain),
                    plain,
                }
            }
        };
        ctx.reply_html(&answer.html, &answer.plain).await
    }

    async fn settings(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "app_id".to_string(),
            Value::String(self.app_id.lock().await.clone()),
        );
        data
    }

    async fn apply_settings(&self, data: &Map<String, Value>) -> Result<()> {
        if let Some(app_id) = data.get("app_id").and_then(Value::as_str) {
            if !app_id.is_empty() {
                *self.app_id.lock().await = app_id.to_string();
            }
        }
        Ok(())
    }
}

fn is_primary(pod: &Pod) -> bool {
    pod.primary || pod.title.contains("Definition") || pod.title.contains("Result")
}

/// Render the pods of a result.
///
/// Returns the primary pod (or the first other pod with text) and the
/// rendering of every pod that has text.
pub fn render_pods(res: &QueryResult) -> (Option<Rendered>, Rendered) {
    let mut htmls: Vec<String> = Vec::new();
    let mut texts: Vec<String> = Vec::new();
    let mut primary: Option<Rendered> = None;
    let mut fallback: Option<Rendered> = None;

    for pod in &res.pods {
        let mut pod_htmls: Vec<String> = Vec::new();
        let mut pod_texts: Vec<String> = Vec::new();

        for subpod in &pod.subpods {
            let Some(text) = subpod.plaintext.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let (html, plain) = match subpod.title.as_deref().filter(|t| !t.is_empty()) {
                Some(title) => (
                    format!("<strong>{}</strong>: {}", escape_html(title), escape_html(text)),
                    format!("{title}: {text}"),
                ),
                None => (escape_html(text), text.to_string()),
            };
            pod_htmls.extend(html.split('\n').map(|s| format!("<li>{s}</li>")));
            pod_texts.extend(plain.split('\n').map(|s| format!("- {s}")));
        }

        if pod_texts.is_empty() {
            continue;
        }

        let mut html_lines = vec![format!("<p><strong>{}</strong>\n<ul>", escape_html(&pod.title))];
        html_lines.extend(pod_htmls);
        html_lines.push("</ul></p>".to_string());

        let mut text_lines = vec![pod.title.clone()];
        text_lines.extend(pod_texts);

        let rendered = Rendered {
            html: html_lines.join("\n"),
            plain: text_lines.join("\n"),
        };
        htmls.push(rendered.html.clone());
        texts.push(rendered.plain.clone());

        if primary.is_none() && is_primary(pod) {
            primary = Some(rendered);
        } else if fallback.is_none() {
            fallback = Some(rendered);
        }
    }

    let full = Rendered {
        html: htmls.join("\n"),
        plain: texts.join("\n"),
    };
    (primary.or(fallback), full)
}
