pub mod quotations;

use std::sync::Arc;

use crate::services::conversion::ConversionService;
use crate::services::quotations::QuotationService;

/// Service container shared through the router state.
#[derive(Clone)]
pub struct AppServices {
    pub quotations: Arc<QuotationService>,
    pub conversion: Arc<ConversionService>,
}
