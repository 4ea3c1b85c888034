pub mod features;
pub mod impute;
pub mod resample;

use crate::model::grid::SarimaGrid;
use crate::processing::impute::{impute, ImputationStrategy};
use crate::types::month::Calendar;
use crate::types::series::MonthlySeries;

/// Aligns a series onto `calendar` and fills its interior gaps.
///
/// Months outside the observed range stay `NaN`; padding is applied when frames are
/// assembled so the observed range stays recoverable.
pub fn normalize_series(
    series: &MonthlySeries,
    calendar: &Calendar,
    strategy: ImputationStrategy,
    grid: &SarimaGrid,
) -> MonthlySeries {
    let mut aligned = series.align(calendar);
    impute(&mut aligned, strategy, grid);
    aligned
}
