use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Group;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Create, Lookup, Join, List }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Create => "create",
        Phase::Lookup => "lookup",
        Phase::Join => "join",
        Phase::List => "list",
    }}
    fn span(&self) -> Span { match self {
        Phase::Create => info_span!("create"),
        Phase::Lookup => info_span!("lookup"),
        Phase::Join => info_span!("join"),
        Phase::List => info_span!("list"),
    }}
}

impl OpMarker for Group {
    const NAME: &'static str = "group";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("group") }
}
