//! Placement search for single-container 3D packing.
//!
//! Implements a greedy extreme point heuristic:
//! - items are sorted once, largest volume first (stable)
//! - the cumulative weight cutoff and volume buffer end the run early
//! - each item tries all six orientations at every extreme point
//! - the feasible pair with the lowest fit score is committed
//!
//! All run state lives in a [`PackingContext`] created per call, so packing
//! is a pure, reentrant function of its inputs.

use std::cmp::Ordering;
use std::fmt;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::extreme_points::{ExtremePoints, feasible_placement};
use crate::geometry::{Orientation, rotate};
use crate::model::{ContainerSpec, Item, ItemSpec, PackingLimits, PlacedItem, ValidationError};
use crate::types::{Dimensional, Vec3};

/// Configuration for the packing algorithm.
///
/// Holds the limits applied when a caller does not supply its own, and the
/// evaluation strategy of the orientation × point search.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Weight cutoff used when a request does not specify one
    pub default_weight_cutoff: f64,
    /// Buffer percentage used when a request does not specify one
    pub default_buffer_percentage: f64,
    /// Evaluate candidate pairs on the rayon pool instead of sequentially
    pub parallel_scoring: bool,
}

impl PackingConfig {
    pub const DEFAULT_WEIGHT_CUTOFF: f64 = 100.0;
    pub const DEFAULT_BUFFER_PERCENTAGE: f64 = 90.0;
    pub const DEFAULT_PARALLEL_SCORING: bool = false;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    /// Resolves the limits of one run, falling back to the configured defaults.
    pub fn limits(
        &self,
        weight_cutoff: Option<f64>,
        buffer_percentage: Option<f64>,
    ) -> Result<PackingLimits, ValidationError> {
        PackingLimits::new(
            weight_cutoff.unwrap_or(self.default_weight_cutoff),
            buffer_percentage.unwrap_or(self.default_buffer_percentage),
        )
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            default_weight_cutoff: Self::DEFAULT_WEIGHT_CUTOFF,
            default_buffer_percentage: Self::DEFAULT_BUFFER_PERCENTAGE,
            parallel_scoring: Self::DEFAULT_PARALLEL_SCORING,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the default weight cutoff.
    pub fn default_weight_cutoff(mut self, cutoff: f64) -> Self {
        self.config.default_weight_cutoff = cutoff;
        self
    }

    /// Sets the default buffer percentage.
    pub fn default_buffer_percentage(mut self, percentage: f64) -> Self {
        self.config.default_buffer_percentage = percentage;
        self
    }

    /// Enables or disables parallel candidate evaluation.
    pub fn parallel_scoring(mut self, enabled: bool) -> Self {
        self.config.parallel_scoring = enabled;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Why an item was left out while the run continued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoFeasiblePosition,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::NoFeasiblePosition => "no_feasible_position",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoFeasiblePosition => write!(
                f,
                "No orientation fits at any extreme point without overlapping placed items"
            ),
        }
    }
}

/// Why the run ended before every item was attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    WeightCutoff,
    VolumeCap,
}

impl StopReason {
    pub fn code(&self) -> &'static str {
        match self {
            StopReason::WeightCutoff => "weight_cutoff",
            StopReason::VolumeCap => "volume_cap",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::WeightCutoff => {
                write!(f, "Next item would exceed the cumulative weight cutoff")
            }
            StopReason::VolumeCap => {
                write!(f, "Next item would exceed the fillable container volume")
            }
        }
    }
}

/// Result of a packing run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PackingOutcome {
    /// Placements in commit order
    pub placements: Vec<PlacedItem>,
    pub total_volume: f64,
    pub total_weight: f64,
    pub container_volume: f64,
    pub max_fillable_volume: f64,
    /// Number of items handed to the run
    pub item_count: usize,
    /// Set when a cap ended the run before all items were attempted
    pub stop_reason: Option<StopReason>,
}

impl PackingOutcome {
    /// Number of placed items.
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Indicates whether every input item was placed.
    pub fn is_complete(&self) -> bool {
        self.placements.len() == self.item_count
    }

    /// Share of the container volume occupied by placed items (0.0 to 100.0).
    pub fn utilization_percent(&self) -> f64 {
        if self.container_volume <= 0.0 {
            return 0.0;
        }
        (self.total_volume / self.container_volume) * 100.0
    }
}

/// Events emitted during a run to allow live visualization.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// The run begins.
    Started {
        item_count: usize,
        #[schema(value_type = [f64; 3])]
        container_dims: (f64, f64, f64),
        weight_cutoff: f64,
        max_fillable_volume: f64,
    },
    /// An item was committed.
    ItemPlaced {
        item_index: usize,
        #[schema(value_type = u8)]
        orientation: Orientation,
        #[schema(value_type = [f64; 3])]
        pos: (f64, f64, f64),
        #[schema(value_type = [f64; 3])]
        dims: (f64, f64, f64),
        weight: f64,
        total_volume: f64,
        total_weight: f64,
    },
    /// An item had no feasible placement; the run continues.
    ItemSkipped {
        item_index: usize,
        #[schema(value_type = [f64; 3])]
        dims: (f64, f64, f64),
        weight: f64,
        reason_code: String,
        reason: String,
    },
    /// A cap ended the run at `item_index`; `remaining` items were never attempted.
    Stopped {
        item_index: usize,
        remaining: usize,
        reason_code: String,
        reason: String,
    },
    /// Packing finished.
    Finished {
        placed: usize,
        total_volume: f64,
        total_weight: f64,
    },
}

/// Fit score of a box of size `dims` anchored at `point`.
///
/// `(L - (x+l)) * (W - (y+w)) * (H - (z+h)) + (x + y + z)`. Lower is better.
///
/// # Examples
/// ```
/// use warehouse_packer::model::ContainerSpec;
/// use warehouse_packer::optimizer::fit_score;
/// use warehouse_packer::types::Vec3;
///
/// let container = ContainerSpec::new((10.0, 10.0, 10.0)).unwrap();
/// let score = fit_score(Vec3::zero(), Vec3::new(5.0, 5.0, 5.0), &container);
/// assert_eq!(score, 125.0);
/// ```
pub fn fit_score(point: Vec3, dims: Vec3, container: &ContainerSpec) -> f64 {
    let residual = container.dimensions() - (point + dims);
    residual.volume() + point.manhattan()
}

/// A scored feasible (orientation, point) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    /// Position in the orientation-major enumeration order
    seq: usize,
    orientation: Orientation,
    position: Vec3,
    dims: Vec3,
    score: f64,
}

/// Mutable state of one packing run.
///
/// Holds the placed items, the extreme point set and the running totals.
#[derive(Clone, Debug)]
pub struct PackingContext<'a> {
    container: &'a ContainerSpec,
    weight_cutoff: f64,
    max_fillable_volume: f64,
    placed: Vec<PlacedItem>,
    points: ExtremePoints,
    total_volume: f64,
    total_weight: f64,
}

impl<'a> PackingContext<'a> {
    pub fn new(container: &'a ContainerSpec, limits: &PackingLimits) -> Self {
        Self {
            container,
            weight_cutoff: limits.weight_cutoff(),
            max_fillable_volume: limits.max_fillable_volume(container),
            placed: Vec::new(),
            points: ExtremePoints::new(container),
            total_volume: 0.0,
            total_weight: 0.0,
        }
    }

    pub fn placed(&self) -> &[PlacedItem] {
        &self.placed
    }

    pub fn extreme_points(&self) -> &ExtremePoints {
        &self.points
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Checks the cumulative caps for the next item.
    ///
    /// Weight is checked before volume.
    pub fn check_caps(&self, item: &Item) -> Result<(), StopReason> {
        if self.total_weight + item.weight > self.weight_cutoff {
            return Err(StopReason::WeightCutoff);
        }
        if self.total_volume + item.volume() > self.max_fillable_volume {
            return Err(StopReason::VolumeCap);
        }
        Ok(())
    }

    /// Searches the best feasible placement for `item` and commits it.
    ///
    /// Returns the committed placement, or `None` if no orientation fits at
    /// any extreme point.
    pub fn place(&mut self, item: &Item, parallel: bool) -> Option<&PlacedItem> {
        let best = if parallel {
            self.best_candidate_parallel(item)
        } else {
            self.best_candidate(item)
        }?;

        let placed = PlacedItem {
            item_index: item.index,
            orientation: best.orientation,
            position: best.position.as_tuple(),
            dims: best.dims.as_tuple(),
            weight: item.weight,
        };
        self.total_weight += item.weight;
        self.total_volume += item.volume();
        self.points.record_placement(&placed);
        self.placed.push(placed);
        self.placed.last()
    }

    /// Scores the pair at enumeration index `seq`, if feasible.
    fn evaluate(&self, seq: usize, orientation: Orientation, dims: Vec3) -> Option<Candidate> {
        let point_count = self.points.len();
        let position = self.points.as_slice()[seq % point_count];
        if !feasible_placement(position, dims, &self.placed, self.container) {
            return None;
        }
        Some(Candidate {
            seq,
            orientation,
            position,
            dims,
            score: fit_score(position, dims, self.container),
        })
    }

    /// Orientation 0→5 outer, extreme points in insertion order inner.
    /// The first pair with the strictly lowest score wins.
    fn best_candidate(&self, item: &Item) -> Option<Candidate> {
        let point_count = self.points.len();
        let mut best: Option<Candidate> = None;

        for (o_idx, orientation) in Orientation::ALL.iter().enumerate() {
            let dims = rotate(item.dims_as_vec3(), *orientation);
            for p_idx in 0..point_count {
                let seq = o_idx * point_count + p_idx;
                if let Some(candidate) = self.evaluate(seq, *orientation, dims) {
                    update_best(&mut best, candidate);
                }
            }
        }

        best
    }

    /// Same selection as [`Self::best_candidate`], evaluated on the rayon pool.
    ///
    /// The reduction orders by `(score, seq)`, which reproduces the
    /// first-strict-minimum rule of the sequential search.
    fn best_candidate_parallel(&self, item: &Item) -> Option<Candidate> {
        let point_count = self.points.len();
        let source = item.dims_as_vec3();

        (0..Orientation::ALL.len() * point_count)
            .into_par_iter()
            .filter_map(|seq| {
                let orientation = Orientation::ALL[seq / point_count];
                self.evaluate(seq, orientation, rotate(source, orientation))
            })
            .min_by(compare_candidates)
    }

    /// Consumes the context into the run result.
    pub fn into_outcome(self, item_count: usize, stop_reason: Option<StopReason>) -> PackingOutcome {
        PackingOutcome {
            placements: self.placed,
            total_volume: self.total_volume,
            total_weight: self.total_weight,
            container_volume: self.container.volume(),
            max_fillable_volume: self.max_fillable_volume,
            item_count,
            stop_reason,
        }
    }
}

fn update_best(best: &mut Option<Candidate>, candidate: Candidate) {
    match best {
        None => *best = Some(candidate),
        Some(current) => {
            if candidate.score < current.score {
                *best = Some(candidate);
            }
        }
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.seq.cmp(&b.seq))
}

/// Validates raw input and packs it with the default configuration.
///
/// # Parameters
/// * `container_dims` - Container (length, width, height)
/// * `items` - Item specifications in caller order
/// * `weight_cutoff` - Maximum cumulative weight
/// * `buffer_percentage` - Usable share of the container volume, in (0, 100]
///
/// # Returns
/// `Err(ValidationError)` before any placement if an input is malformed
pub fn pack(
    container_dims: (f64, f64, f64),
    items: &[ItemSpec],
    weight_cutoff: f64,
    buffer_percentage: f64,
) -> Result<PackingOutcome, ValidationError> {
    let container = ContainerSpec::new(container_dims)?;
    let limits = PackingLimits::new(weight_cutoff, buffer_percentage)?;
    let items = ItemSpec::validate_all(items)?;
    Ok(pack_items(&container, &items, limits))
}

/// Packs validated items into one container with the default configuration.
pub fn pack_items(container: &ContainerSpec, items: &[Item], limits: PackingLimits) -> PackingOutcome {
    pack_items_with_config(container, items, limits, PackingConfig::default())
}

/// Packing with a custom configuration.
pub fn pack_items_with_config(
    container: &ContainerSpec,
    items: &[Item],
    limits: PackingLimits,
    config: PackingConfig,
) -> PackingOutcome {
    pack_items_with_progress(container, items, limits, config, |_| {})
}

/// Packing with a custom configuration and a live progress callback.
///
/// Calls `on_event` for every decision (suitable for SSE).
pub fn pack_items_with_progress(
    container: &ContainerSpec,
    items: &[Item],
    limits: PackingLimits,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackingOutcome {
    let mut ctx = PackingContext::new(container, &limits);
    on_event(&PackEvent::Started {
        item_count: items.len(),
        container_dims: container.dimensions().as_tuple(),
        weight_cutoff: limits.weight_cutoff(),
        max_fillable_volume: limits.max_fillable_volume(container),
    });

    // Largest first; sort_by is stable so equal volumes keep input order.
    let mut order: Vec<&Item> = items.iter().collect();
    order.sort_by(|a, b| {
        b.volume()
            .partial_cmp(&a.volume())
            .unwrap_or(Ordering::Equal)
    });

    let mut stop_reason = None;
    for (position, item) in order.iter().enumerate() {
        if let Err(reason) = ctx.check_caps(item) {
            let remaining = order.len() - position;
            debug!(
                "stopping at item {} ({} remaining): {}",
                item.index, remaining, reason
            );
            on_event(&PackEvent::Stopped {
                item_index: item.index,
                remaining,
                reason_code: reason.code().to_string(),
                reason: reason.to_string(),
            });
            stop_reason = Some(reason);
            break;
        }

        match ctx.place(item, config.parallel_scoring).cloned() {
            Some(placed) => {
                debug!(
                    "placed item {} at {:?} as {:?} (orientation {})",
                    placed.item_index, placed.position, placed.dims, placed.orientation
                );
                on_event(&PackEvent::ItemPlaced {
                    item_index: placed.item_index,
                    orientation: placed.orientation,
                    pos: placed.position,
                    dims: placed.dims,
                    weight: placed.weight,
                    total_volume: ctx.total_volume(),
                    total_weight: ctx.total_weight(),
                });
            }
            None => {
                let reason = SkipReason::NoFeasiblePosition;
                debug!("skipped item {}: {}", item.index, reason);
                on_event(&PackEvent::ItemSkipped {
                    item_index: item.index,
                    dims: item.dims,
                    weight: item.weight,
                    reason_code: reason.code().to_string(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    let outcome = ctx.into_outcome(items.len(), stop_reason);
    info!(
        "packed {}/{} items, volume {:.3} of {:.3}, weight {:.3}",
        outcome.placed_count(),
        outcome.item_count,
        outcome.total_volume,
        outcome.max_fillable_volume,
        outcome.total_weight
    );
    on_event(&PackEvent::Finished {
        placed: outcome.placed_count(),
        total_volume: outcome.total_volume,
        total_weight: outcome.total_weight,
    });
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::overlaps;

    fn cube(dims: (f64, f64, f64)) -> ContainerSpec {
        ContainerSpec::new(dims).unwrap()
    }

    fn items(specs: &[(f64, f64, f64, f64)]) -> Vec<Item> {
        specs
            .iter()
            .enumerate()
            .map(|(idx, &(l, w, h, weight))| Item::new(idx, (l, w, h), weight).unwrap())
            .collect()
    }

    fn demo_items() -> Vec<Item> {
        items(&[
            (10.0, 5.0, 2.0, 1.5),
            (15.0, 10.0, 5.0, 3.0),
            (5.0, 5.0, 5.0, 0.5),
            (8.0, 8.0, 8.0, 2.5),
            (20.0, 15.0, 10.0, 6.0),
            (20.0, 15.0, 10.0, 6.0),
            (16.0, 15.0, 10.0, 6.0),
            (20.0, 15.0, 13.0, 6.0),
            (5.0, 7.0, 10.0, 6.0),
            (9.0, 1.0, 10.0, 6.0),
            (5.0, 5.0, 5.0, 6.0),
            (5.0, 5.0, 5.0, 6.0),
            (5.0, 5.0, 5.0, 6.0),
            (5.0, 5.0, 5.0, 6.0),
            (5.0, 5.0, 5.0, 6.0),
            (10.0, 10.0, 5.0, 6.0),
        ])
    }

    fn assert_invariants(outcome: &PackingOutcome, container: &ContainerSpec, limits: &PackingLimits) {
        let bounds = container.dimensions();
        for (i, a) in outcome.placements.iter().enumerate() {
            assert!(
                a.bounding_box().inside(&bounds),
                "placement {:?} leaves the container",
                a
            );
            for b in &outcome.placements[i + 1..] {
                assert!(
                    !overlaps(&a.bounding_box(), &b.bounding_box()),
                    "placements {:?} and {:?} overlap",
                    a,
                    b
                );
            }
        }

        let weight: f64 = outcome.placements.iter().map(|p| p.weight).sum();
        let volume: f64 = outcome.placements.iter().map(|p| p.volume()).sum();
        assert!((outcome.total_weight - weight).abs() < 1e-9);
        assert!((outcome.total_volume - volume).abs() < 1e-9);
        assert!(outcome.total_weight <= limits.weight_cutoff());
        assert!(outcome.total_volume <= limits.max_fillable_volume(container));
    }

    #[test]
    fn single_item_lands_in_origin() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(&container, &items(&[(5.0, 5.0, 5.0, 1.0)]), limits);

        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.placements[0].position, (0.0, 0.0, 0.0));
        assert_eq!(outcome.placements[0].orientation, Orientation::LWH);
        assert_eq!(outcome.total_volume, 125.0);
        assert_eq!(outcome.total_weight, 1.0);
        assert_eq!(outcome.stop_reason, None);
    }

    #[test]
    fn second_oversized_item_is_skipped() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(6.0, 6.0, 6.0, 1.0), (6.0, 6.0, 6.0, 1.0)]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.placements[0].item_index, 0);
        assert_eq!(outcome.total_volume, 216.0);
        assert_eq!(outcome.total_weight, 1.0);
        assert_eq!(outcome.stop_reason, None);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn weight_cutoff_stops_before_first_item() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(10.0, 100.0).unwrap();

        let outcome = pack_items(&container, &items(&[(1.0, 1.0, 1.0, 50.0)]), limits);

        assert!(outcome.placements.is_empty());
        assert_eq!(outcome.total_weight, 0.0);
        assert_eq!(outcome.total_volume, 0.0);
        assert_eq!(outcome.stop_reason, Some(StopReason::WeightCutoff));
    }

    #[test]
    fn weight_cutoff_stops_even_if_lighter_items_follow() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(10.0, 100.0).unwrap();

        // Sorted by volume: 4³ (w 8), 3³ (w 5) stops, 1³ (w 1) is never tried.
        let outcome = pack_items(
            &container,
            &items(&[(1.0, 1.0, 1.0, 1.0), (3.0, 3.0, 3.0, 5.0), (4.0, 4.0, 4.0, 8.0)]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.placements[0].item_index, 2);
        assert_eq!(outcome.total_weight, 8.0);
        assert_eq!(outcome.stop_reason, Some(StopReason::WeightCutoff));
    }

    #[test]
    fn volume_buffer_stops_at_threshold_crossing_item() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 50.0).unwrap();
        assert_eq!(limits.max_fillable_volume(&container), 500.0);

        // 400 fits, 400 + 200 > 500 stops; the 100 slab would fit but is never tried.
        let outcome = pack_items(
            &container,
            &items(&[
                (10.0, 10.0, 4.0, 1.0),
                (10.0, 10.0, 2.0, 1.0),
                (10.0, 10.0, 1.0, 1.0),
            ]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.total_volume, 400.0);
        assert_eq!(outcome.max_fillable_volume, 500.0);
        assert_eq!(outcome.stop_reason, Some(StopReason::VolumeCap));
    }

    #[test]
    fn volume_buffer_allows_exact_fill() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 50.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(10.0, 10.0, 5.0, 1.0), (1.0, 1.0, 1.0, 1.0)]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.total_volume, 500.0);
        assert_eq!(outcome.stop_reason, Some(StopReason::VolumeCap));
    }

    #[test]
    fn largest_item_is_committed_first() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(2.0, 2.0, 2.0, 1.0), (8.0, 8.0, 8.0, 1.0)]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 2);
        assert_eq!(outcome.placements[0].item_index, 1);
        assert_eq!(outcome.placements[0].position, (0.0, 0.0, 0.0));
        // All three extreme points score 8; the first one recorded wins.
        assert_eq!(outcome.placements[1].item_index, 0);
        assert_eq!(outcome.placements[1].position, (8.0, 0.0, 0.0));
    }

    #[test]
    fn equal_volumes_keep_input_order() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(2.0, 5.0, 1.0, 1.0), (5.0, 1.0, 2.0, 2.0), (1.0, 2.0, 5.0, 3.0)]),
            limits,
        );

        let order: Vec<usize> = outcome.placements.iter().map(|p| p.item_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn ties_pick_first_orientation() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        // A cube scores the same in all six orientations.
        let outcome = pack_items(&container, &items(&[(3.0, 3.0, 3.0, 1.0)]), limits);
        assert_eq!(outcome.placements[0].orientation, Orientation::LWH);
    }

    #[test]
    fn rotation_is_used_when_only_rotated_item_fits() {
        let container = cube((10.0, 4.0, 2.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(&container, &items(&[(2.0, 4.0, 10.0, 1.0)]), limits);

        assert_eq!(outcome.placed_count(), 1);
        let placed = &outcome.placements[0];
        assert_eq!(placed.dims, (10.0, 4.0, 2.0));
        assert_eq!(placed.orientation, Orientation::HWL);
        assert_eq!(placed.orientation.apply((2.0, 4.0, 10.0)), placed.dims);
    }

    #[test]
    fn skipped_item_does_not_stop_run() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(6.0, 6.0, 6.0, 1.0), (6.0, 6.0, 5.0, 1.0), (4.0, 4.0, 4.0, 1.0)]),
            limits,
        );

        let order: Vec<usize> = outcome.placements.iter().map(|p| p.item_index).collect();
        assert_eq!(order, vec![0, 2]);
        assert_eq!(outcome.stop_reason, None);
    }

    #[test]
    fn zero_weight_items_pass_zero_cutoff() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(0.0, 100.0).unwrap();

        let outcome = pack_items(
            &container,
            &items(&[(5.0, 5.0, 5.0, 0.0), (5.0, 5.0, 5.0, 0.0)]),
            limits,
        );

        assert_eq!(outcome.placed_count(), 2);
        assert_eq!(outcome.total_weight, 0.0);
    }

    #[test]
    fn demo_workload_respects_invariants() {
        let container = cube((30.0, 25.0, 20.0));
        let limits = PackingLimits::new(100.0, 90.0).unwrap();

        let outcome = pack_items(&container, &demo_items(), limits);

        assert!(outcome.placed_count() > 0);
        assert_invariants(&outcome, &container, &limits);
    }

    #[test]
    fn many_small_items_respect_invariants() {
        let container = cube((12.0, 9.0, 7.0));
        let limits = PackingLimits::new(1000.0, 100.0).unwrap();
        let specs: Vec<(f64, f64, f64, f64)> = (0..60)
            .map(|i| {
                let a = 1.0 + (i % 4) as f64;
                let b = 1.0 + (i % 3) as f64;
                let c = 1.0 + (i % 5) as f64 * 0.5;
                (a, b, c, 1.0)
            })
            .collect();

        let outcome = pack_items(&container, &items(&specs), limits);

        assert!(outcome.placed_count() > 1);
        assert_invariants(&outcome, &container, &limits);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let container = cube((30.0, 25.0, 20.0));
        let limits = PackingLimits::new(100.0, 90.0).unwrap();

        let first = pack_items(&container, &demo_items(), limits);
        let second = pack_items(&container, &demo_items(), limits);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn parallel_scoring_matches_sequential() {
        let container = cube((30.0, 25.0, 20.0));
        let limits = PackingLimits::new(100.0, 90.0).unwrap();
        let parallel = PackingConfig::builder().parallel_scoring(true).build();

        let sequential = pack_items(&container, &demo_items(), limits);
        let concurrent = pack_items_with_config(&container, &demo_items(), limits, parallel);

        assert_eq!(sequential, concurrent);
    }

    #[test]
    fn progress_events_describe_every_decision() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(3.0, 100.0).unwrap();
        let mut events = Vec::new();

        let outcome = pack_items_with_progress(
            &container,
            &items(&[
                (6.0, 6.0, 6.0, 1.0),
                (6.0, 6.0, 6.0, 1.0),
                (2.0, 2.0, 2.0, 1.0),
                (1.0, 1.0, 1.0, 5.0),
            ]),
            limits,
            PackingConfig::default(),
            |evt| events.push(evt.clone()),
        );

        assert_eq!(outcome.placed_count(), 2);
        assert!(matches!(events[0], PackEvent::Started { item_count: 4, .. }));
        assert!(matches!(events[1], PackEvent::ItemPlaced { item_index: 0, .. }));
        assert!(matches!(
            &events[2],
            PackEvent::ItemSkipped { item_index: 1, reason_code, .. } if reason_code == "no_feasible_position"
        ));
        assert!(matches!(events[3], PackEvent::ItemPlaced { item_index: 2, .. }));
        assert!(matches!(
            &events[4],
            PackEvent::Stopped { item_index: 3, remaining: 1, reason_code, .. } if reason_code == "weight_cutoff"
        ));
        assert!(matches!(events[5], PackEvent::Finished { placed: 2, .. }));
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn context_tracks_points_and_totals() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();
        let mut ctx = PackingContext::new(&container, &limits);
        let item = Item::new(0, (10.0, 5.0, 5.0), 2.0).unwrap();

        assert!(ctx.check_caps(&item).is_ok());
        let placed = ctx.place(&item, false).cloned().unwrap();

        assert_eq!(placed.position, (0.0, 0.0, 0.0));
        assert_eq!(ctx.total_volume(), 250.0);
        assert_eq!(ctx.total_weight(), 2.0);
        assert_eq!(ctx.placed().len(), 1);
        // (x+l) lands on the boundary and is kept.
        assert_eq!(ctx.extreme_points().len(), 4);
    }

    #[test]
    fn raw_pack_validates_before_packing() {
        let good = ItemSpec {
            length: 5.0,
            width: 5.0,
            height: 5.0,
            weight: 1.0,
        };
        let bad = ItemSpec {
            length: 5.0,
            width: 0.0,
            height: 5.0,
            weight: 1.0,
        };

        let outcome = pack((10.0, 10.0, 10.0), &[good.clone()], 100.0, 100.0).unwrap();
        assert_eq!(outcome.total_volume, 125.0);

        assert!(matches!(
            pack((10.0, 10.0, 10.0), &[good.clone(), bad], 100.0, 100.0),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            pack((10.0, 10.0, 10.0), &[good.clone()], 100.0, 0.0),
            Err(ValidationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            pack((10.0, -1.0, 10.0), &[good], 100.0, 50.0),
            Err(ValidationError::InvalidDimension(_))
        ));
    }

    #[test]
    fn config_limits_fall_back_to_defaults() {
        let config = PackingConfig::default();
        let limits = config.limits(None, Some(50.0)).unwrap();
        assert_eq!(limits.weight_cutoff(), PackingConfig::DEFAULT_WEIGHT_CUTOFF);
        assert_eq!(limits.buffer_percentage(), 50.0);
        assert!(config.limits(Some(-1.0), None).is_err());
    }

    #[test]
    fn fit_score_prefers_large_residual_near_origin() {
        let container = cube((10.0, 10.0, 10.0));
        let dims = Vec3::new(2.0, 2.0, 2.0);

        let origin = fit_score(Vec3::zero(), dims, &container);
        let corner = fit_score(Vec3::new(8.0, 8.0, 8.0), dims, &container);

        assert_eq!(origin, 512.0);
        assert_eq!(corner, 24.0);
        assert!(corner < origin);
    }

    #[test]
    fn utilization_percent_reports_share_of_container() {
        let container = cube((10.0, 10.0, 10.0));
        let limits = PackingLimits::new(100.0, 100.0).unwrap();

        let outcome = pack_items(&container, &items(&[(10.0, 10.0, 5.0, 1.0)]), limits);
        assert!((outcome.utilization_percent() - 50.0).abs() < 1e-9);
        assert!(outcome.is_complete());
    }
}
