//! Two-click finish-line calibration on the overlay canvas.

use crate::effect::{DrawOp, Effect, Effects};
use crate::model::{CalibrationLine, Point};
use crate::storage::{CoordinateStore, KeyValueStore, StorageError};

#[derive(Debug)]
pub struct CalibrationTool<S> {
    store: CoordinateStore<S>,
    active: bool,
    first_point: Option<Point>,
}

impl<S: KeyValueStore> CalibrationTool<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: CoordinateStore::new(store),
            active: false,
            first_point: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn first_point(&self) -> Option<Point> {
        self.first_point
    }

    pub fn store(&self) -> &CoordinateStore<S> {
        &self.store
    }

    /// Switch calibration mode. Leaving it discards a half-placed line.
    pub fn set_mode(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.first_point = None;
        }
        log::debug!("📏 Calibration mode {}", if active { "on" } else { "off" });
    }

    /// Handle a canvas click.
    ///
    /// Returns the completed line after the second click. The line is drawn and
    /// calibration mode ends even if persisting it fails.
    pub fn on_click(
        &mut self,
        point: Point,
        out: &mut Effects,
    ) -> Result<Option<CalibrationLine>, StorageError> {
        if !self.active {
            return Ok(None);
        }

        let Some(start) = self.first_point.take() else {
            out.push(Effect::Draw { op: DrawOp::Clear });
            out.push(Effect::Draw {
                op: DrawOp::Marker(point),
            });
            self.first_point = Some(point);
            return Ok(None);
        };

        let line = CalibrationLine::from_points(start, point);
        out.push(Effect::Draw {
            op: DrawOp::Marker(point),
        });
        out.push(Effect::Draw {
            op: DrawOp::Segment(start, point),
        });
        self.active = false;
        self.store.save(&line)?;
        Ok(Some(line))
    }

    /// Redraw the persisted line, if any, without entering calibration mode.
    pub fn restore(&self, out: &mut Effects) -> Option<CalibrationLine> {
        let line = self.store.load()?;
        draw_line(&line, out);
        Some(line)
    }

    /// Clear the surface and return to the post-load state.
    pub fn reset(&mut self, out: &mut Effects) {
        self.active = false;
        self.first_point = None;
        out.push(Effect::Draw { op: DrawOp::Clear });
    }
}

fn draw_line(line: &CalibrationLine, out: &mut Effects) {
    out.push(Effect::Draw {
        op: DrawOp::Marker(line.start()),
    });
    out.push(Effect::Draw {
        op: DrawOp::Marker(line.end()),
    });
    out.push(Effect::Draw {
        op: DrawOp::Segment(line.start(), line.end()),
    });
}
