//! Request lifecycle registry.
//!
//! Live requests sit in an `FxHashMap` keyed by id; the unplanned ones are
//! additionally kept in a submission-ordered list, which is what the
//! dispatcher drains each cycle.  Requests that reach a final status move to
//! the archive.  Nothing is ever dropped.

use rustc_hash::FxHashMap;

use drt_core::{RequestId, SimTime, VehicleId};

use crate::{CancelReason, DemandError, DemandResult, Request, RequestStatus};

/// A request together with its lifecycle record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestEntry {
    pub request: Request,
    pub status: RequestStatus,
    /// Vehicle the request was committed to.
    pub vehicle: Option<VehicleId>,
    pub planned_pickup: Option<SimTime>,
    pub planned_dropoff: Option<SimTime>,
    pub picked_up_at: Option<SimTime>,
    pub dropped_off_at: Option<SimTime>,
    pub cancelled_at: Option<SimTime>,
}

impl RequestEntry {
    fn new(request: Request) -> Self {
        Self {
            request,
            status: RequestStatus::Unplanned,
            vehicle: None,
            planned_pickup: None,
            planned_dropoff: None,
            picked_up_at: None,
            dropped_off_at: None,
            cancelled_at: None,
        }
    }

    /// `true` between pickup and dropoff.
    pub fn is_onboard(&self) -> bool {
        self.picked_up_at.is_some() && self.dropped_off_at.is_none()
    }

    /// Seconds between submission and actual pickup.
    pub fn wait_secs(&self) -> Option<u64> {
        self.picked_up_at.map(|t| t.saturating_since(self.request.submitted))
    }
}

#[derive(Debug, Default)]
pub struct RequestRegistry {
    active: FxHashMap<RequestId, RequestEntry>,
    unplanned: Vec<RequestId>,
    archive: FxHashMap<RequestId, RequestEntry>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request as `Unplanned`.
    pub fn submit(&mut self, request: Request) -> DemandResult<()> {
        let id = request.id;
        if self.active.contains_key(&id) || self.archive.contains_key(&id) {
            return Err(DemandError::DuplicateRequest(id));
        }
        if let Some(w) = request.window {
            if w.latest < w.earliest {
                return Err(DemandError::InvalidRequest {
                    id,
                    reason: format!("window closes at {} before it opens at {}", w.latest, w.earliest),
                });
            }
        }
        tracing::debug!(request = %id, origin = %request.origin, destination = %request.destination, "request submitted");
        self.active.insert(id, RequestEntry::new(request));
        self.unplanned.push(id);
        Ok(())
    }

    /// Unplanned requests in submission order.
    pub fn pending(&self) -> Vec<RequestId> {
        self.unplanned.clone()
    }

    pub fn get(&self, id: RequestId) -> DemandResult<&RequestEntry> {
        self.active
            .get(&id)
            .or_else(|| self.archive.get(&id))
            .ok_or(DemandError::RequestNotFound(id))
    }

    pub fn request(&self, id: RequestId) -> DemandResult<&Request> {
        self.get(id).map(|e| &e.request)
    }

    pub fn status(&self, id: RequestId) -> DemandResult<&RequestStatus> {
        self.get(id).map(|e| &e.status)
    }

    /// `Unplanned → Planned`, recording the vehicle and planned times.
    pub fn mark_planned(
        &mut self,
        id: RequestId,
        vehicle: VehicleId,
        pickup: SimTime,
        dropoff: SimTime,
    ) -> DemandResult<()> {
        let entry = self.active_entry(id)?;
        if entry.status != RequestStatus::Unplanned {
            return Err(transition(id, &entry.status, "planned"));
        }
        entry.status = RequestStatus::Planned;
        entry.vehicle = Some(vehicle);
        entry.planned_pickup = Some(pickup);
        entry.planned_dropoff = Some(dropoff);
        self.unplanned.retain(|&r| r != id);
        Ok(())
    }

    /// `Unplanned | Planned → Cancelled(reason)`; the request is archived.
    pub fn mark_cancelled(&mut self, id: RequestId, reason: CancelReason, at: SimTime) -> DemandResult<()> {
        let entry = self.active_entry(id)?;
        if !matches!(entry.status, RequestStatus::Unplanned | RequestStatus::Planned) {
            return Err(transition(id, &entry.status, "cancelled"));
        }
        tracing::info!(request = %id, %reason, "request cancelled");
        entry.status = RequestStatus::Cancelled(reason);
        entry.cancelled_at = Some(at);
        self.unplanned.retain(|&r| r != id);
        self.archive_entry(id);
        Ok(())
    }

    /// Record boarding of a `Planned` request.
    pub fn mark_picked_up(&mut self, id: RequestId, at: SimTime) -> DemandResult<()> {
        let entry = self.active_entry(id)?;
        if entry.status != RequestStatus::Planned || entry.picked_up_at.is_some() {
            return Err(transition(id, &entry.status, "picked up"));
        }
        entry.picked_up_at = Some(at);
        Ok(())
    }

    /// `Planned → Performed` on dropoff; the request is archived.
    pub fn mark_performed(&mut self, id: RequestId, at: SimTime) -> DemandResult<()> {
        let entry = self.active_entry(id)?;
        if entry.status != RequestStatus::Planned {
            return Err(transition(id, &entry.status, "performed"));
        }
        entry.status = RequestStatus::Performed;
        entry.dropped_off_at = Some(at);
        self.archive_entry(id);
        Ok(())
    }

    pub fn unplanned_count(&self) -> usize {
        self.unplanned.len()
    }

    /// Requests not yet in a final status.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn archived(&self) -> impl Iterator<Item = &RequestEntry> {
        self.archive.values()
    }

    pub fn archived_count(&self) -> usize {
        self.archive.len()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn active_entry(&mut self, id: RequestId) -> DemandResult<&mut RequestEntry> {
        if let Some(entry) = self.archive.get(&id) {
            return Err(transition(id, &entry.status, "changed"));
        }
        self.active.get_mut(&id).ok_or(DemandError::RequestNotFound(id))
    }

    fn archive_entry(&mut self, id: RequestId) {
        if let Some(entry) = self.active.remove(&id) {
            self.archive.insert(id, entry);
        }
    }
}

fn transition(id: RequestId, from: &RequestStatus, to: &'static str) -> DemandError {
    DemandError::InvalidTransition { id, from: from.clone(), to }
}
