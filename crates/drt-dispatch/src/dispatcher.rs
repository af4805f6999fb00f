//! The insertion-heuristic dispatcher.

use drt_core::SimTime;
use drt_demand::{CancelReason, Request, RequestRegistry};
use drt_fleet::{Fleet, Vehicle};
use drt_spatial::{RoadNetwork, Router};

use crate::insertion::{InsertionContext, commit, evaluate};
use crate::{
    AllVehicles, Assignment, CandidatePolicy, DispatchConfig, DispatchReport, DispatchResult,
    InfeasibleRequest, Insertion, Rejection,
};

/// Matches pending requests to vehicles, one request at a time.
///
/// Each cycle walks the pending requests in submission order.  For every
/// request all candidate vehicles are evaluated against their current
/// schedules, the cheapest feasible insertion is committed (lowest vehicle
/// id on ties), and the request becomes `Planned`.  Later requests in the
/// same cycle see the updated schedules.  Nothing already committed is ever
/// revised.
pub struct Dispatcher<C: CandidatePolicy = AllVehicles> {
    config: DispatchConfig,
    policy: C,
}

impl Dispatcher<AllVehicles> {
    pub fn new(config: DispatchConfig) -> DispatchResult<Self> {
        Self::with_policy(config, AllVehicles)
    }
}

impl<C: CandidatePolicy> Dispatcher<C> {
    pub fn with_policy(config: DispatchConfig, policy: C) -> DispatchResult<Self> {
        config.validate()?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn policy(&self) -> &C {
        &self.policy
    }

    /// Run one dispatch cycle at `now`.
    ///
    /// Stale requests are cancelled first (if an expiry policy is
    /// configured), then every remaining pending request is either planned
    /// or reported back as infeasible.  An `Err` means a schedule could not
    /// be mutated as evaluated and the cycle stopped half-way.
    pub fn run_cycle<R: Router>(
        &self,
        now: SimTime,
        fleet: &mut Fleet,
        requests: &mut RequestRegistry,
        network: &RoadNetwork,
        router: &R,
    ) -> DispatchResult<DispatchReport> {
        let mut report = DispatchReport::new(now);
        self.cancel_stale(now, requests, &mut report)?;

        let ctx = InsertionContext { network, router, config: &self.config, now };
        for id in requests.pending() {
            let request = requests.request(id)?.clone();
            match self.best_insertion(&ctx, fleet, &request) {
                Ok(best) => {
                    let assignment = Assignment {
                        request: id,
                        vehicle: best.vehicle,
                        pickup_at: best.pickup_at,
                        dropoff_at: best.dropoff_at,
                        cost: best.cost,
                    };
                    commit(best, fleet.get_mut(assignment.vehicle)?)?;
                    requests.mark_planned(id, assignment.vehicle, assignment.pickup_at, assignment.dropoff_at)?;
                    tracing::debug!(
                        request = %id,
                        vehicle = %assignment.vehicle,
                        pickup = %assignment.pickup_at,
                        dropoff = %assignment.dropoff_at,
                        cost = assignment.cost,
                        "request planned"
                    );
                    report.planned.push(assignment);
                }
                Err(rejections) => {
                    for r in &rejections {
                        tracing::debug!(request = %id, vehicle = %r.vehicle, reason = %r.reason, "candidate rejected");
                    }
                    report.unplanned.push(InfeasibleRequest { request: id, rejections });
                }
            }
        }

        tracing::info!(
            now = %now,
            planned = report.planned.len(),
            unplanned = report.unplanned.len(),
            cancelled = report.cancelled.len(),
            "dispatch cycle"
        );
        Ok(report)
    }

    fn cancel_stale(
        &self,
        now: SimTime,
        requests: &mut RequestRegistry,
        report: &mut DispatchReport,
    ) -> DispatchResult<()> {
        if self.config.expire_after_secs.is_none() && !self.config.cancel_after_window {
            return Ok(());
        }
        for id in requests.pending() {
            let request = requests.request(id)?;
            let expired = self
                .config
                .expire_after_secs
                .is_some_and(|secs| now.saturating_since(request.submitted) > secs);
            let closed = self.config.cancel_after_window
                && request.latest_pickup().is_some_and(|latest| now > latest);
            let reason = match (expired, closed) {
                (true, _) => CancelReason::Expired,
                (false, true) => CancelReason::WindowClosed,
                (false, false) => continue,
            };
            requests.mark_cancelled(id, reason.clone(), now)?;
            report.cancelled.push((id, reason));
        }
        Ok(())
    }

    /// The cheapest feasible insertion, or every candidate's rejection.
    fn best_insertion<R: Router>(
        &self,
        ctx: &InsertionContext<'_, R>,
        fleet: &Fleet,
        request: &Request,
    ) -> Result<Insertion, Vec<Rejection>> {
        let mut ids = self.policy.candidates(request, fleet);
        ids.sort_unstable();
        ids.dedup();
        let vehicles: Vec<&Vehicle> = ids.iter().filter_map(|&id| fleet.get(id).ok()).collect();

        let mut best: Option<Insertion> = None;
        let mut rejections = Vec::new();
        // Outcomes arrive in ascending vehicle id, so a strict comparison
        // keeps the lowest id among equal costs.
        for outcome in evaluate_all(ctx, &vehicles, request) {
            match outcome {
                Ok(candidate) => {
                    let better = best
                        .as_ref()
                        .is_none_or(|b| candidate.cost.total_cmp(&b.cost).is_lt());
                    if better {
                        best = Some(candidate);
                    }
                }
                Err(rejection) => rejections.push(rejection),
            }
        }
        best.ok_or(rejections)
    }
}

fn evaluate_all<R: Router>(
    ctx: &InsertionContext<'_, R>,
    vehicles: &[&Vehicle],
    request: &Request,
) -> Vec<Result<Insertion, Rejection>> {
    let one = |v: &&Vehicle| {
        evaluate(ctx, v, request).map_err(|reason| Rejection { vehicle: v.id, reason })
    };

    #[cfg(not(feature = "parallel"))]
    {
        vehicles.iter().map(one).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        vehicles.par_iter().map(one).collect()
    }
}
