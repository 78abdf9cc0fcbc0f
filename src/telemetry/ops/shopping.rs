use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Shopping;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Plan,
    FetchSchedules,
    Aggregate,
    FetchItems,
    Materialize,
    DeleteAuto,
    InsertAuto,
    List,
    Add,
    Toggle,
    Remove,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::FetchSchedules => "fetch_schedules",
        Phase::Aggregate => "aggregate",
        Phase::FetchItems => "fetch_items",
        Phase::Materialize => "materialize",
        Phase::DeleteAuto => "delete_auto",
        Phase::InsertAuto => "insert_auto",
        Phase::List => "list",
        Phase::Add => "add",
        Phase::Toggle => "toggle",
        Phase::Remove => "remove",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::FetchSchedules => info_span!("fetch_schedules"),
        Phase::Aggregate => info_span!("aggregate"),
        Phase::FetchItems => info_span!("fetch_items"),
        Phase::Materialize => info_span!("materialize"),
        Phase::DeleteAuto => info_span!("delete_auto"),
        Phase::InsertAuto => info_span!("insert_auto"),
        Phase::List => info_span!("list"),
        Phase::Add => info_span!("add"),
        Phase::Toggle => info_span!("toggle"),
        Phase::Remove => info_span!("remove"),
    }}
}

impl OpMarker for Shopping {
    const NAME: &'static str = "shopping";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("shopping") }
}
