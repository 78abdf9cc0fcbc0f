use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Recipe;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Insert, List, Show, Update, Remove }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Insert => "insert",
        Phase::List => "list",
        Phase::Show => "show",
        Phase::Update => "update",
        Phase::Remove => "remove",
    }}
    fn span(&self) -> Span { match self {
        Phase::Insert => info_span!("insert"),
        Phase::List => info_span!("list"),
        Phase::Show => info_span!("show"),
        Phase::Update => info_span!("update"),
        Phase::Remove => info_span!("remove"),
    }}
}

impl OpMarker for Recipe {
    const NAME: &'static str = "recipe";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("recipe") }
}
