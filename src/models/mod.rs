//! Data models for quotes, clients, messaging and reports

pub mod client;
pub mod messaging;
pub mod quote;
pub mod report;

pub use client::{Client, ClientInput, ClientWithChannel, NewSalesChannel, SalesChannel};
pub use messaging::{
    format_money, plan_sequence, render_message, render_template, MessageContext,
    MessageSequence, MessageTemplate, PlannedMessage, SequenceInput, SequenceStep, StepInput,
    TemplateInput, TemplateOrder,
};
pub use quote::{
    generate_folio, NewQuote, PricedQuote, Quote, QuoteDetail, QuoteItem, QuoteStatus,
    QuoteSummary,
};
pub use report::{GeneralStats, GroupTotal, ReportFilters, ReportRow, SalesReport};
