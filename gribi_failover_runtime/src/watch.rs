// gRIBI Failover: Backup Next-Hop-Group Validation
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Bounded polling of telemetry values

use crate::Error;

use log::*;
use std::thread;
use std::time::{Duration, Instant};

/// Poll `query` every `interval` until it returns `Some` or until `timeout` has elapsed. The query
/// is executed at least once. Returns `Ok(None)` on timeout, and propagates the first error of the
/// query.
pub fn await_value<T, F>(
    timeout: Duration,
    interval: Duration,
    mut query: F,
) -> Result<Option<T>, Error>
where
    F: FnMut() -> Result<Option<T>, Error>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = query()? {
            trace!("Watch succeeded after {} ms", start.elapsed().as_millis());
            return Ok(Some(value));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            debug!("Watch timed out after {} ms", elapsed.as_millis());
            return Ok(None);
        }
        thread::sleep(interval.min(timeout - elapsed));
    }
}
