//! WhatsApp message templates and sequences
//!
//! Templates are single messages an operator picks from a list. Sequences
//! ("macros") are ordered steps sent one after another with optional delays.
//! This module only renders and plans messages; delivery happens elsewhere.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Template kind whose content goes through placeholder substitution
pub const TEXT_TEMPLATE_KIND: &str = "template";
/// Step kind that carries an image
pub const IMAGE_STEP_KIND: &str = "image";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageTemplate {
    pub id: Uuid,
    pub name: String,
    /// "template" (text with placeholders) or "document"
    pub kind: String,
    pub content: String,
    pub media_url: Option<String>,
    pub visible: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default = "default_template_kind")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_template_kind() -> String {
    TEXT_TEMPLATE_KIND.to_string()
}

fn default_true() -> bool {
    true
}

/// New template order: ids in their desired display order
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateOrder {
    pub ids: Vec<Uuid>,
}

impl TemplateOrder {
    /// `(id, sort_order)` pairs, numbered from 1 in request order
    pub fn positions(&self) -> Vec<(Uuid, i32)> {
        self.ids.iter().copied().zip(1..).collect()
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageSequence {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SequenceStep {
    pub id: Uuid,
    pub sequence_id: Uuid,
    pub kind: String,
    pub content: String,
    pub media_urls: Json<Vec<String>>,
    pub delay_seconds: i32,
    pub active: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepInput {
    #[serde(default = "default_step_kind")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub delay_seconds: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_step_kind() -> String {
    "text".to_string()
}

impl StepInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.delay_seconds < 0 {
            return Err("delay_seconds must not be negative".to_string());
        }
        Ok(())
    }
}

/// Quote values available to placeholders
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub client_name: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub list_price: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

/// `12345.6` -> `"12,345.60"`
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Substitute `{{nombre}}`, `{{descuento}}`, `{{total}}` and `{{final}}`.
pub fn render_message(content: &str, ctx: &MessageContext) -> String {
    let name = ctx
        .client_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Cliente");
    let discount = ctx
        .discount_percent
        .filter(|d| !d.is_zero())
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| "0".to_string());

    content
        .replace("{{nombre}}", name)
        .replace("{{descuento}}", &discount)
        .replace("{{total}}", &format_money(ctx.list_price.unwrap_or_default()))
        .replace("{{final}}", &format_money(ctx.final_price.unwrap_or_default()))
}

/// A message ready to hand to the WhatsApp bot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMessage {
    pub kind: String,
    pub text: String,
    pub media_url: Option<String>,
    /// Wait before sending this message
    pub delay_seconds: i32,
}

/// Text for a single template sent about a quote.
///
/// Document templates are not rendered; they carry the quote reference.
pub fn render_template(
    template: &MessageTemplate,
    project_name: &str,
    ctx: &MessageContext,
) -> PlannedMessage {
    let text = if template.kind == TEXT_TEMPLATE_KIND {
        render_message(&template.content, ctx)
    } else {
        format!("Cotización: {}", project_name)
    };
    PlannedMessage {
        kind: template.kind.clone(),
        text,
        media_url: template.media_url.clone(),
        delay_seconds: 0,
    }
}

/// Active steps in sort order, rendered. Image steps carry their first URL.
pub fn plan_sequence(steps: &[SequenceStep], ctx: &MessageContext) -> Vec<PlannedMessage> {
    let mut active: Vec<&SequenceStep> = steps.iter().filter(|s| s.active).collect();
    active.sort_by_key(|s| s.sort_order);

    active
        .into_iter()
        .map(|step| PlannedMessage {
            kind: step.kind.clone(),
            text: render_message(&step.content, ctx),
            media_url: if step.kind == IMAGE_STEP_KIND {
                step.media_urls.0.first().cloned()
            } else {
                None
            },
            delay_seconds: step.delay_seconds.max(0),
        })
        .collect()
}
