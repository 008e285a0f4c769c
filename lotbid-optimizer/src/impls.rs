/// Highest unit price wins each line independently
mod best_offer;
pub use best_offer::BestOfferOptimizer;
