//! Practice plan documents: catalog metadata, per-script day-by-day plans,
//! and the cached fetcher that loads them.

mod document;
mod source;

pub use document::{
    Category, DayEntry, LocalizedText, PhaseEntry, PlanCatalog, PlanDocument, Template,
    TemplateStatus,
};
pub use source::PlanSource;
