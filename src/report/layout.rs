//! Deterministic placement of circular info-panels inside a bounding box.
//!
//! Each supported panel count has a hand-specified arrangement; with the
//! default diameter every circle fits the box and no two circles overlap,
//! given the gutter.

/// One placed panel: center coordinates plus diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSlot {
    pub cx: f64,
    pub cy: f64,
    pub diameter: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("cannot lay out {count} panels; supported counts are 3 through 7")]
    UnsupportedCount { count: usize },
}

pub const DEFAULT_GUTTER: f64 = 10.0;

/// Lays out `count` circles inside the box at `(x, y)` with the given
/// dimensions. `diameter` overrides the computed size; `gutter` defaults to
/// [`DEFAULT_GUTTER`]. Counts outside 3..=7 are a configuration error.
pub fn circle_layout(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    count: usize,
    diameter: Option<f64>,
    gutter: Option<f64>,
) -> Result<Vec<PanelSlot>, LayoutError> {
    let g = gutter.unwrap_or(DEFAULT_GUTTER);

    // Top-left corner positions per arrangement, converted to centers below.
    let (d, corners): (f64, Vec<(f64, f64)>) = match count {
        // One centered on top, two beneath.
        3 => {
            let d = diameter.unwrap_or_else(|| half_split(width, height, g));
            (
                d,
                vec![
                    (x + d / 2.0 + g / 2.0, y),
                    (x, y + d + g),
                    (x + d + g, y + d + g),
                ],
            )
        }
        // 2x2 grid, right column pushed to the far edge.
        4 => {
            let d = diameter.unwrap_or_else(|| half_split(width, height, g));
            let right = right_column(x, width, d, g);
            (
                d,
                vec![(x, y), (right, y), (x, y + d + g), (right, y + d + g)],
            )
        }
        // Two columns of three rows; the middle row holds one centered panel.
        5 => {
            let d = diameter.unwrap_or_else(|| two_by_three(width, height, g));
            let right = right_column(x, width, d, g);
            (
                d,
                vec![
                    (x, y),
                    (right, y),
                    (x + width / 2.0 - d / 2.0, y + d + g),
                    (x, y + 2.0 * g + 2.0 * d),
                    (right, y + 2.0 * g + 2.0 * d),
                ],
            )
        }
        // Full two-column, three-row grid.
        6 => {
            let d = diameter.unwrap_or_else(|| two_by_three(width, height, g));
            let right = right_column(x, width, d, g);
            (
                d,
                vec![
                    (x, y),
                    (right, y),
                    (x, y + d + g),
                    (right, y + d + g),
                    (x, y + 2.0 * g + 2.0 * d),
                    (right, y + 2.0 * g + 2.0 * d),
                ],
            )
        }
        // 2-3-2 rows.
        7 => {
            let d = diameter
                .unwrap_or_else(|| ((width - 2.0 * g) / 3.0).min((height - 2.0 * g) / 3.0));
            (
                d,
                vec![
                    (x + d / 2.0 + g / 2.0, y),
                    (x + width - 3.0 * d / 2.0 - g / 2.0, y),
                    (x, y + d + g),
                    (x + d + g, y + d + g),
                    (x + 2.0 * d + 2.0 * g, y + d + g),
                    (x + d / 2.0 + g / 2.0, y + 2.0 * g + 2.0 * d),
                    (x + width - 3.0 * d / 2.0 - g / 2.0, y + 2.0 * g + 2.0 * d),
                ],
            )
        }
        count => return Err(LayoutError::UnsupportedCount { count }),
    };

    Ok(corners
        .into_iter()
        .map(|(cx, cy)| PanelSlot {
            cx: cx + d / 2.0,
            cy: cy + d / 2.0,
            diameter: d,
        })
        .collect())
}

fn half_split(width: f64, height: f64, gutter: f64) -> f64 {
    ((width - gutter) / 2.0).min((height - gutter) / 2.0)
}

fn two_by_three(width: f64, height: f64, gutter: f64) -> f64 {
    ((width - gutter) / 2.0).min((height - 2.0 * gutter) / 3.0)
}

fn right_column(x: f64, width: f64, diameter: f64, gutter: f64) -> f64 {
    (x + width - diameter).max(x + diameter + gutter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: (f64, f64, f64, f64) = (10.0, 50.0, 190.0, 225.0);

    fn layout(count: usize) -> Vec<PanelSlot> {
        let (x, y, w, h) = FRAME;
        circle_layout(x, y, w, h, count, None, Some(5.0)).expect("supported count")
    }

    #[test]
    fn supported_counts_return_distinct_slots() {
        for count in 3..=7 {
            let slots = layout(count);
            assert_eq!(slots.len(), count, "{count} panels expected");
            for (i, a) in slots.iter().enumerate() {
                for b in slots.iter().skip(i + 1) {
                    assert!(
                        (a.cx, a.cy) != (b.cx, b.cy),
                        "slot centers must be distinct for {count} panels"
                    );
                }
            }
        }
    }

    #[test]
    fn circles_never_overlap() {
        for count in 3..=7 {
            let slots = layout(count);
            for (i, a) in slots.iter().enumerate() {
                for b in slots.iter().skip(i + 1) {
                    let distance = ((a.cx - b.cx).powi(2) + (a.cy - b.cy).powi(2)).sqrt();
                    assert!(
                        distance >= a.diameter - 1e-9,
                        "{count} panels: centers {distance} apart with diameter {}",
                        a.diameter
                    );
                }
            }
        }
    }

    #[test]
    fn circles_stay_inside_bounding_box() {
        let (x, y, w, h) = FRAME;
        for count in 3..=7 {
            for slot in layout(count) {
                let r = slot.diameter / 2.0;
                assert!(slot.cx - r >= x - 1e-9, "{count}: left edge");
                assert!(slot.cx + r <= x + w + 1e-9, "{count}: right edge");
                assert!(slot.cy - r >= y - 1e-9, "{count}: top edge");
                assert!(slot.cy + r <= y + h + 1e-9, "{count}: bottom edge");
            }
        }
    }

    #[test]
    fn unsupported_counts_are_named_errors() {
        let (x, y, w, h) = FRAME;
        for count in [0, 1, 2, 8, 12] {
            let result = circle_layout(x, y, w, h, count, None, None);
            assert_eq!(result, Err(LayoutError::UnsupportedCount { count }));
        }
    }

    #[test]
    fn caller_may_override_diameter() {
        let (x, y, w, h) = FRAME;
        let slots = circle_layout(x, y, w, h, 4, Some(40.0), None).expect("supported count");
        assert!(slots.iter().all(|slot| slot.diameter == 40.0));
    }
}
