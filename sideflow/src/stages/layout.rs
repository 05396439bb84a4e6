//! Progress floors of a task's stages.

use super::{ProgressRange, Stage};
use crate::errors::TaskError;

#[derive(Debug, Clone)]
struct StageSlot {
    label: String,
    floor: u8,
    sub_range: Option<ProgressRange>,
}

/// Immutable description of a task's stages: labels, resolved floors and
/// sub-progress windows.
///
/// The layout outlives the stage actions, so progress can still be computed
/// and labelled after the actions have been consumed by `run()`.
#[derive(Debug, Clone, Default)]
pub struct StageLayout {
    slots: Vec<StageSlot>,
}

impl StageLayout {
    /// Resolves the floors of the given stages.
    ///
    /// A stage with a sub-range but no explicit base progress uses the start
    /// of its range as its floor.
    pub fn resolve(stages: &[Stage]) -> Result<Self, TaskError> {
        let declared: Vec<Option<u8>> = stages
            .iter()
            .map(|stage| {
                stage
                    .base_progress()
                    .or_else(|| stage.sub_range().map(|range| range.from()))
            })
            .collect();
        let floors = resolve_floors(&declared)?;

        let layout = Self {
            slots: stages
                .iter()
                .zip(floors)
                .map(|(stage, floor)| StageSlot {
                    label: stage.label().to_string(),
                    floor,
                    sub_range: stage.sub_range(),
                })
                .collect(),
        };

        for (index, slot) in layout.slots.iter().enumerate() {
            if let Some(range) = slot.sub_range {
                let next = layout.next_floor(index);
                if range.from() > range.to() || range.from() < slot.floor || range.to() > next {
                    return Err(TaskError::invalid_stages(format!(
                        "stage '{}' sub-range {range} lies outside its floors {}..{next}",
                        slot.label, slot.floor
                    )));
                }
            }
        }

        Ok(layout)
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the layout has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the label of the stage at `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.label.as_str())
    }

    /// Returns the floor of the stage at `index`; 100 past the last stage.
    #[must_use]
    pub fn floor(&self, index: usize) -> u8 {
        self.slots.get(index).map_or(100, |slot| slot.floor)
    }

    /// Returns the floor of the stage after `index`; 100 for the last stage.
    #[must_use]
    pub fn next_floor(&self, index: usize) -> u8 {
        self.floor(index + 1)
    }

    /// Returns every resolved floor in stage order.
    #[must_use]
    pub fn floors(&self) -> Vec<u8> {
        self.slots.iter().map(|slot| slot.floor).collect()
    }

    /// Computes the combined progress while stage `index` runs with the given
    /// sub-progress.
    #[must_use]
    pub fn progress_at(&self, index: usize, sub_progress: u8) -> u8 {
        let Some(slot) = self.slots.get(index) else {
            return 100;
        };
        if sub_progress == 0 {
            return slot.floor;
        }
        let window = slot.sub_range.unwrap_or(ProgressRange::unchecked(
            slot.floor,
            self.next_floor(index),
        ));
        window.map(sub_progress)
    }
}

/// Resolves per-stage floors from the declared ones.
///
/// Undeclared floors are interpolated by stage index between the nearest
/// declared floor before them (stage 0 defaults to 0) and the nearest one
/// after them, where a virtual floor of 100 sits one past the last stage.
pub fn resolve_floors(declared: &[Option<u8>]) -> Result<Vec<u8>, TaskError> {
    let len = declared.len();
    let mut anchors: Vec<(usize, u8)> = Vec::with_capacity(len + 2);
    if declared.first().map_or(true, Option::is_none) {
        anchors.push((0, 0));
    }
    for (index, value) in declared.iter().enumerate() {
        let Some(value) = *value else { continue };
        if value > 100 {
            return Err(TaskError::invalid_stages(format!(
                "stage {index} declares progress {value} above 100"
            )));
        }
        if let Some(&(_, previous)) = anchors.last() {
            if value < previous {
                return Err(TaskError::invalid_stages(format!(
                    "stage {index} declares progress {value} below an earlier floor {previous}"
                )));
            }
        }
        anchors.push((index, value));
    }
    anchors.push((len, 100));

    let mut floors = vec![0_u8; len];
    for pair in anchors.windows(2) {
        let (start, low) = pair[0];
        let (end, high) = pair[1];
        for (index, floor) in floors.iter_mut().enumerate().take(end).skip(start) {
            let offset = (index - start) as u32;
            let gap = u32::from(high - low);
            // end > start whenever this loop body runs
            *floor = low + (offset * gap / (end - start) as u32) as u8;
        }
    }
    Ok(floors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop(label: &str) -> Stage {
        Stage::new(label, |_ctx| Ok(()))
    }

    #[test]
    fn test_undeclared_floors_are_evenly_spaced() {
        assert_eq!(resolve_floors(&[None; 4]).unwrap(), vec![0, 25, 50, 75]);
        assert_eq!(resolve_floors(&[None; 3]).unwrap(), vec![0, 33, 66]);
    }

    #[test]
    fn test_declared_floors_are_kept() {
        let declared = [0, 1, 2, 84, 86, 88, 90].map(Some);
        assert_eq!(resolve_floors(&declared).unwrap(), vec![0, 1, 2, 84, 86, 88, 90]);
    }

    #[test]
    fn test_gaps_are_interpolated() {
        let declared = [Some(0), Some(1), Some(2), None, Some(84), Some(90), None];
        assert_eq!(resolve_floors(&declared).unwrap(), vec![0, 1, 2, 43, 84, 90, 95]);
    }

    #[test]
    fn test_decreasing_floors_rejected() {
        assert!(resolve_floors(&[Some(10), Some(5)]).is_err());
        assert!(resolve_floors(&[Some(101)]).is_err());
    }

    #[test]
    fn test_empty_layout() {
        assert!(resolve_floors(&[]).unwrap().is_empty());
        let layout = StageLayout::resolve(&[]).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.progress_at(0, 0), 100);
    }

    #[test]
    fn test_sub_progress_fills_gap_to_next_floor() {
        let stages: Vec<Stage> = [0, 1, 2, 84, 86, 88, 90]
            .iter()
            .map(|floor| noop("step").with_base_progress(*floor))
            .collect();
        let layout = StageLayout::resolve(&stages).unwrap();

        assert_eq!(layout.progress_at(2, 0), 2);
        assert_eq!(layout.progress_at(2, 50), 43);
        assert_eq!(layout.progress_at(2, 100), 84);
        assert_eq!(layout.progress_at(6, 50), 95);
    }

    #[test]
    fn test_sub_range_anchors_floor() {
        let stages = vec![
            noop("Preparing").with_base_progress(0),
            noop("Decompiling").with_sub_range(ProgressRange::new(3, 83).unwrap()),
            noop("Extracting sources").with_base_progress(84),
        ];
        let layout = StageLayout::resolve(&stages).unwrap();

        assert_eq!(layout.floors(), vec![0, 3, 84]);
        assert_eq!(layout.progress_at(1, 50), 43);
        assert_eq!(layout.progress_at(1, 100), 83);
        assert_eq!(layout.label(1), Some("Decompiling"));
    }

    #[test]
    fn test_sub_range_outside_floors_rejected() {
        let stages = vec![
            noop("a").with_base_progress(10).with_sub_range(ProgressRange::new(5, 20).unwrap()),
            noop("b").with_base_progress(30),
        ];
        assert!(StageLayout::resolve(&stages).is_err());

        let stages = vec![
            noop("a").with_sub_range(ProgressRange::new(0, 60).unwrap()),
            noop("b").with_base_progress(30),
        ];
        assert!(StageLayout::resolve(&stages).is_err());
    }

    #[test]
    fn test_reversed_sub_range_rejected() {
        let stages = vec![noop("Decompiling").with_sub_range(ProgressRange::unchecked(50, 10))];
        let err = StageLayout::resolve(&stages).unwrap_err();
        assert!(matches!(err, TaskError::InvalidStages(_)));
    }
}
