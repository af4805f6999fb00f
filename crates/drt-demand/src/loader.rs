//! CSV request loader.
//!
//! # CSV format
//!
//! ```csv
//! request_id,passenger_id,origin,destination,submit_time,earliest,latest
//! 0,0,4,17,25200,,
//! 1,5,8,2,25260,25500,26100
//! ```
//!
//! `earliest`/`latest` are both given or both empty.  Rows are returned in
//! submission order (ties by request id).

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use drt_core::{NodeId, PassengerId, RequestId, SimTime};

use crate::{DemandError, DemandResult, Request};

#[derive(Deserialize)]
struct RequestRecord {
    request_id:   u32,
    passenger_id: u32,
    origin:       u32,
    destination:  u32,
    submit_time:  u64,
    earliest:     Option<u64>,
    latest:       Option<u64>,
}

pub fn load_requests_csv(path: &Path) -> DemandResult<Vec<Request>> {
    let file = std::fs::File::open(path)?;
    load_requests_reader(file)
}

/// Like [`load_requests_csv`] but accepts any `Read` source.
pub fn load_requests_reader<R: Read>(reader: R) -> DemandResult<Vec<Request>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut requests = Vec::new();

    for result in csv_reader.deserialize::<RequestRecord>() {
        let row = result.map_err(|e| DemandError::Parse(e.to_string()))?;
        let id = RequestId(row.request_id);
        let mut req = Request::new(
            id,
            PassengerId(row.passenger_id),
            NodeId(row.origin),
            NodeId(row.destination),
            SimTime(row.submit_time),
        );
        match (row.earliest, row.latest) {
            (Some(e), Some(l)) => req = req.with_window(SimTime(e), SimTime(l)),
            (None, None) => {}
            _ => {
                return Err(DemandError::Parse(format!(
                    "request {id}: earliest and latest must be given together"
                )));
            }
        }
        requests.push(req);
    }

    requests.sort_by_key(|r| (r.submitted, r.id));
    Ok(requests)
}
