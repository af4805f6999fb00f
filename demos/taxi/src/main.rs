//! taxi: demand-responsive taxi service on a synthetic grid.
//!
//! Eight vehicles (four of them electric) serve random trip requests on a
//! 6 × 6 grid for a four-hour morning.  Two chargers are available to the
//! electric vehicles.  Pass a JSON file as the first argument to override
//! any part of [`DemoConfig`]; set `RUST_LOG=debug` to see every dispatch
//! decision.

mod network;

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use drt_core::{SimConfig, SimTime};
use drt_demand::{RandomDemand, RandomDemandConfig, RequestStatus};
use drt_dispatch::{ChargingPolicy, DispatchConfig, DispatchReport};
use drt_ev::{CurveRegistry, load_chargers_reader};
use drt_fleet::load_fleet_reader;
use drt_mobility::TaskEvent;
use drt_sim::{SimBuilder, SimObserver, SimStats};
use drt_spatial::DijkstraRouter;

use network::build_grid;

// ── Embedded scenario data ────────────────────────────────────────────────────

// Service from 06:00 to 12:00; vehicles 4–7 are electric.
const FLEET_CSV: &str = "\
vehicle_id,start_node,start_time,end_time,capacity,battery_kwh,initial_soc,curve,kwh_per_km,aux_kw\n\
0,0,21600,43200,4,,,,,\n\
1,5,21600,43200,4,,,,,\n\
2,30,21600,43200,4,,,,,\n\
3,35,21600,43200,4,,,,,\n\
4,14,21600,43200,4,60,0.35,tesla,0.18,1.5\n\
5,15,21600,43200,4,60,0.25,tesla,0.18,1.5\n\
6,20,21600,43200,4,40,0.30,nissan_leaf,0.16,1.0\n\
7,21,21600,43200,4,40,0.22,nissan_leaf,0.16,1.0\n\
";

// One AC charger on a node, one fast charger given by coordinates.
const CHARGERS_CSV: &str = "\
charger_id,node,lat,lon,power_kw,plugs\n\
0,14,,,22.0,2\n\
1,,30.7125,-88.0275,150.0,1\n\
";

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    sim:      SimConfig,
    dispatch: DispatchConfig,
    charging: ChargingPolicy,
    demand:   RandomDemandConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig {
                start_time:              SimTime(21_600),
                end_time:                SimTime(36_000),
                step_secs:               5,
                dispatch_interval_steps: 6, // every 30 s
                seed:                    42,
                num_threads:             None,
            },
            dispatch: DispatchConfig { expire_after_secs: Some(900), ..Default::default() },
            charging: ChargingPolicy::default(),
            demand: RandomDemandConfig {
                mean_interarrival_secs: 45.0,
                lead_secs:              None,
                window_secs:            600,
                start:                  SimTime(21_600),
                end:                    SimTime(34_200),
            },
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ProgressObserver {
    events: usize,
    busy_cycles: u64,
}

impl SimObserver for ProgressObserver {
    fn on_events(&mut self, _now: SimTime, events: &[TaskEvent]) {
        self.events += events.len();
    }

    fn on_dispatch(&mut self, report: &DispatchReport) {
        if report.is_empty() {
            return;
        }
        self.busy_cycles += 1;
        tracing::info!(
            now = %report.now,
            planned = report.planned.len(),
            unplanned = report.unplanned.len(),
            cancelled = report.cancelled.len(),
            charging = report.charging.len(),
            "dispatch"
        );
    }

    fn on_sim_end(&mut self, now: SimTime, stats: &SimStats) {
        tracing::info!(%now, steps = stats.steps, events = self.events, "run complete");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg: DemoConfig = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => DemoConfig::default(),
    };

    println!("=== taxi — rust_drt dispatch core ===");

    // 1. Road network.
    let network = build_grid();
    println!("Road network: {} nodes, {} links", network.node_count(), network.link_count());

    // 2. Fleet and chargers from the embedded CSVs.
    let curves = CurveRegistry::with_presets();
    let fleet = load_fleet_reader(Cursor::new(FLEET_CSV), &curves)?;
    let chargers = load_chargers_reader(Cursor::new(CHARGERS_CSV))?;
    println!(
        "Fleet: {} vehicles ({} electric), {} chargers",
        fleet.len(),
        fleet.iter().filter(|v| v.is_electric()).count(),
        chargers.len()
    );

    // 3. Demand.
    let requests = RandomDemand::new(cfg.demand.clone(), cfg.sim.seed).generate(&network);
    println!("Demand: {} requests", requests.len());
    println!();

    // 4. Build and run.
    let mut sim = SimBuilder::new(cfg.sim.clone(), network, fleet, DijkstraRouter)
        .chargers(chargers)
        .requests(requests)
        .dispatch_config(cfg.dispatch.clone())
        .charging_policy(cfg.charging.clone())
        .build()?;

    let mut obs = ProgressObserver::default();
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    // 5. Summary.
    let stats = sim.stats();
    println!();
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  submitted           : {}", stats.submitted);
    println!("  planned             : {} ({:.1} %)", stats.planned, stats.service_rate() * 100.0);
    println!("  performed           : {}", stats.performed);
    println!("  cancelled           : {}", stats.cancelled);
    println!("  still unplanned     : {}", sim.requests().unplanned_count());
    println!("  dispatch cycles     : {} ({} with work)", stats.dispatch_cycles, obs.busy_cycles);
    println!("  charging sessions   : {} planned, {} completed, {} forfeited",
        stats.charging_planned, stats.charging_completed, stats.charging_forfeited);
    println!("  energy used/charged : {:.1} / {:.1} kWh", stats.energy_used_kwh, stats.energy_charged_kwh);

    let waits: Vec<u64> = sim
        .requests()
        .archived()
        .filter(|e| e.status == RequestStatus::Performed)
        .filter_map(|e| e.wait_secs())
        .collect();
    if !waits.is_empty() {
        let mean = waits.iter().sum::<u64>() as f64 / waits.len() as f64;
        println!("  mean wait to board  : {:.0} s", mean);
    }
    println!();

    // 6. Final vehicle table.
    println!("{:<8} {:<10} {:<8} {:<10}", "Vehicle", "Node", "Tasks", "SoC");
    println!("{}", "-".repeat(38));
    for v in sim.fleet().iter() {
        let node = sim.vehicle_position(v.id).map_or_else(|| "-".to_string(), |(from, _, _)| from.to_string());
        let soc = v
            .battery()
            .map_or_else(|| "-".to_string(), |b| format!("{:.0} %", b.relative_soc() * 100.0));
        println!("{:<8} {:<10} {:<8} {:<10}", v.id.to_string(), node, v.schedule().len(), soc);
    }

    Ok(())
}
