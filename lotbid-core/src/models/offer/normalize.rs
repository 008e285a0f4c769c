use super::{ComponentLine, LinePrice, NormalizedOffer, OfferLine, RawOffer};
use crate::models::{Map, Set};
use std::{fmt::Display, hash::Hash};

/// The ways a submitted offer can be rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// A lot-wide total was negative or not a number
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidTotal {
        /// The offending field
        field: &'static str,
        /// The value supplied
        value: f64,
    },
    /// A line does not belong to the lot's current scope
    #[error("line item {line} is not part of this lot's current scope")]
    UnknownLine {
        /// The line item id
        line: String,
    },
    /// The same line was priced twice
    #[error("line item {line} is priced more than once")]
    DuplicateLine {
        /// The line item id
        line: String,
    },
    /// Nothing in the offer carries a price
    #[error("the offer prices no line and has no take-all total")]
    Empty,
}

/// A usable price: finite and non-negative.
fn valid(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p >= 0.0)
}

fn check_total(field: &'static str, total: Option<f64>) -> Result<Option<f64>, NormalizeError> {
    match total {
        Some(value) if !(value.is_finite() && value >= 0.0) => {
            Err(NormalizeError::InvalidTotal { field, value })
        }
        other => Ok(other),
    }
}

/// The unit price of a component-priced line.
///
/// Selected components with a valid price contribute `price × quantity`
/// (quantity defaulting to 1). The component sum is used only when it is
/// positive; otherwise the manual price applies, if there is one.
fn component_unit_price<L>(line: &ComponentLine<L>) -> Option<f64> {
    let total: f64 = line
        .components
        .iter()
        .filter(|c| c.selected)
        .filter_map(|c| {
            let price = valid(c.unit_price)?;
            let quantity = valid(Some(c.quantity.unwrap_or(1.0)))?;
            Some(price * quantity)
        })
        .sum();

    if total > 0.0 {
        Some(total)
    } else {
        valid(line.manual_price)
    }
}

/// Convert a raw submission into canonical `(line, unit price, quantity)`
/// form.
///
/// `quantities` maps every line item in scope to its current quantity; that
/// value is snapshotted into the offer. Lines without a usable price are left
/// out rather than priced at zero. Prices are in `lot_currency` unless a line
/// says otherwise.
pub fn normalize<L: Clone + Eq + Hash + Display>(
    raw: RawOffer<L>,
    quantities: &Map<L, u32>,
    lot_currency: &str,
) -> Result<NormalizedOffer<L>, NormalizeError> {
    let (priced, take_all_total) = match raw {
        RawOffer::TakeAll { total } => (Vec::new(), check_total("total", Some(total))?),
        RawOffer::PerLine {
            lines,
            take_all_total,
        } => {
            let priced = lines
                .into_iter()
                .map(
                    |LinePrice {
                         line_item_id,
                         unit_price,
                         currency,
                     }| (line_item_id, valid(unit_price), currency),
                )
                .collect::<Vec<_>>();
            (priced, check_total("take_all_total", take_all_total)?)
        }
        RawOffer::PerComponent {
            lines,
            take_all_total,
        } => {
            let priced = lines
                .into_iter()
                .map(|line| {
                    let price = component_unit_price(&line);
                    (line.line_item_id, price, line.currency)
                })
                .collect::<Vec<_>>();
            (priced, check_total("take_all_total", take_all_total)?)
        }
    };

    let mut seen = Set::default();
    let mut lines = Vec::with_capacity(priced.len());
    for (line_item_id, unit_price, currency) in priced {
        let Some(&quantity) = quantities.get(&line_item_id) else {
            return Err(NormalizeError::UnknownLine {
                line: line_item_id.to_string(),
            });
        };
        if !seen.insert(line_item_id.clone()) {
            return Err(NormalizeError::DuplicateLine {
                line: line_item_id.to_string(),
            });
        }
        if let Some(unit_price) = unit_price {
            lines.push(OfferLine {
                line_item_id,
                unit_price,
                quantity,
                currency: currency.unwrap_or_else(|| lot_currency.to_string()),
            });
        }
    }

    if lines.is_empty() && take_all_total.is_none() {
        return Err(NormalizeError::Empty);
    }

    let offer_total = lines.iter().map(OfferLine::value).sum();
    Ok(NormalizedOffer {
        lines,
        take_all_total,
        offer_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, ComponentPrice};
    use approx::assert_relative_eq;

    fn scope() -> Map<u32, u32> {
        [(1, 2), (2, 1), (3, 4)].into_iter().collect()
    }

    fn component(component: Component, price: Option<f64>, quantity: Option<f64>) -> ComponentPrice {
        ComponentPrice {
            component,
            selected: true,
            unit_price: price,
            quantity,
        }
    }

    #[test]
    fn take_all_has_no_lines() {
        let offer = normalize(RawOffer::TakeAll { total: 900.0 }, &scope(), "USD").unwrap();
        assert!(offer.lines.is_empty());
        assert_eq!(offer.take_all_total, Some(900.0));
        assert_relative_eq!(offer.value(), 900.0);
    }

    #[test]
    fn negative_take_all_is_rejected() {
        let err = normalize(RawOffer::<u32>::TakeAll { total: -1.0 }, &scope(), "USD").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidTotal {
                field: "total",
                value: -1.0
            }
        );
    }

    #[test]
    fn per_line_snapshots_quantities_and_drops_bad_prices() {
        let raw = RawOffer::PerLine {
            lines: vec![
                LinePrice {
                    line_item_id: 1,
                    unit_price: Some(100.0),
                    currency: None,
                },
                LinePrice {
                    line_item_id: 2,
                    unit_price: Some(-5.0),
                    currency: None,
                },
                LinePrice {
                    line_item_id: 3,
                    unit_price: None,
                    currency: Some("EUR".to_string()),
                },
            ],
            take_all_total: None,
        };
        let offer = normalize(raw, &scope(), "USD").unwrap();

        assert_eq!(offer.lines.len(), 1);
        assert_eq!(offer.lines[0].quantity, 2);
        assert_eq!(offer.lines[0].currency, "USD");
        assert_relative_eq!(offer.offer_total, 200.0);
        assert_relative_eq!(offer.value(), 200.0);
    }

    #[test]
    fn components_sum_selected_prices_times_quantity() {
        let raw = RawOffer::PerComponent {
            lines: vec![ComponentLine {
                line_item_id: 3,
                components: vec![
                    component(Component::Cpu, Some(40.0), Some(2.0)),
                    component(Component::Memory, Some(5.0), Some(8.0)),
                    component(Component::Drives, Some(10.0), None),
                    ComponentPrice {
                        selected: false,
                        ..component(Component::Gpu, Some(500.0), None)
                    },
                    component(Component::Network, None, Some(2.0)),
                ],
                manual_price: Some(1.0),
                currency: Some("EUR".to_string()),
            }],
            take_all_total: Some(1000.0),
        };
        let offer = normalize(raw, &scope(), "USD").unwrap();

        assert_relative_eq!(offer.lines[0].unit_price, 80.0 + 40.0 + 10.0);
        assert_eq!(offer.lines[0].currency, "EUR");
        assert_relative_eq!(offer.offer_total, 130.0 * 4.0);
        assert_relative_eq!(offer.value(), 1000.0);
    }

    #[test]
    fn manual_price_is_the_fallback_and_unpriced_lines_are_absent() {
        let raw = RawOffer::PerComponent {
            lines: vec![
                ComponentLine {
                    line_item_id: 1,
                    components: vec![component(Component::Cpu, None, Some(2.0))],
                    manual_price: Some(75.0),
                    currency: None,
                },
                ComponentLine {
                    line_item_id: 2,
                    components: vec![component(Component::Cpu, None, None)],
                    manual_price: None,
                    currency: None,
                },
            ],
            take_all_total: None,
        };
        let offer = normalize(raw, &scope(), "USD").unwrap();

        assert_eq!(offer.lines.len(), 1);
        assert_eq!(offer.lines[0].line_item_id, 1);
        assert_relative_eq!(offer.lines[0].unit_price, 75.0);
        assert!(offer.lines.iter().all(|line| line.line_item_id != 2));
    }

    #[test]
    fn unknown_and_duplicate_lines_are_rejected() {
        let price = |line_item_id| LinePrice {
            line_item_id,
            unit_price: Some(1.0),
            currency: None,
        };

        let err = normalize(
            RawOffer::PerLine {
                lines: vec![price(9)],
                take_all_total: None,
            },
            &scope(),
            "USD",
        )
        .unwrap_err();
        assert_eq!(err, NormalizeError::UnknownLine { line: "9".into() });

        let err = normalize(
            RawOffer::PerLine {
                lines: vec![price(1), price(1)],
                take_all_total: None,
            },
            &scope(),
            "USD",
        )
        .unwrap_err();
        assert_eq!(err, NormalizeError::DuplicateLine { line: "1".into() });
    }

    #[test]
    fn an_offer_with_nothing_priced_is_empty() {
        let raw = RawOffer::PerLine {
            lines: vec![LinePrice {
                line_item_id: 1,
                unit_price: None,
                currency: None,
            }],
            take_all_total: None,
        };
        assert_eq!(normalize(raw, &scope(), "USD"), Err(NormalizeError::Empty));
    }
}
