use foundation::time::Time;

/// Redraw bookkeeping for a host-driven animation loop.
///
/// Navigation and tile arrivals call [`RedrawState::request_redraw`]; the loop asks
/// [`RedrawState::begin_frame`] whether to draw and hands the ticket back to
/// [`RedrawState::end_frame`]. A request made while a frame is being drawn survives
/// that frame.
#[derive(Debug, Clone, Default)]
pub struct RedrawState {
    needs_redraw: bool,
    force_redraw: bool,
    redraw_at: Option<Time>,
    requests: u64,
}

/// Proof that a frame was started; carries the request count seen at that moment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct RedrawTicket {
    requests: u64,
}

impl RedrawState {
    pub fn new() -> Self {
        Self {
            needs_redraw: true,
            ..Self::default()
        }
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
        self.requests += 1;
    }

    /// Draw on the next tick even when nothing changed.
    pub fn force_redraw(&mut self) {
        self.force_redraw = true;
    }

    /// Schedules a draw once `at` has passed. Keeps the earlier of two deadlines.
    pub fn request_redraw_at(&mut self, at: Time) {
        self.redraw_at = Some(match self.redraw_at {
            Some(existing) if existing.0 <= at.0 => existing,
            _ => at,
        });
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw || self.force_redraw
    }

    pub fn pending_deadline(&self) -> Option<Time> {
        self.redraw_at
    }

    pub fn begin_frame(&mut self, now: Time) -> Option<RedrawTicket> {
        let deadline_passed = self.redraw_at.is_some_and(|at| now.0 > at.0);
        if deadline_passed {
            self.redraw_at = None;
        } else if !self.needs_redraw && !self.force_redraw {
            return None;
        }
        self.force_redraw = false;
        Some(RedrawTicket {
            requests: self.requests,
        })
    }

    /// Clears the dirty flag unless another request arrived during the frame.
    pub fn end_frame(&mut self, ticket: RedrawTicket) {
        if self.requests == ticket.requests {
            self.needs_redraw = false;
        }
    }
}
