mod chart_kind;
mod record;
mod tag_filter;

pub use chart_kind::{ChartKind, ParseChartKindError};
pub use record::{Record, ResultSet};
pub use tag_filter::{ALL_TAGS, TagFilter};
