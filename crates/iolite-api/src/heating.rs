//! Heating schedule REST client.
//!
//! Stateless CRUD against `/heating/api/heating/{room_id}`: comfort
//! temperature and heating intervals. The interval API has no concept
//! of days — an interval starting at minute 0 is Monday morning, and
//! each later day is a 24-hour offset in minutes.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Inclusive comfort temperature bounds enforced client-side.
pub const MIN_COMFORT_TEMPERATURE: f64 = 14.0;
pub const MAX_COMFORT_TEMPERATURE: f64 = 30.0;

/// `true` if `temperature` is an acceptable comfort setting.
pub fn comfort_in_range(temperature: f64) -> bool {
    (MIN_COMFORT_TEMPERATURE..=MAX_COMFORT_TEMPERATURE).contains(&temperature)
}

// ── Day offsets ──────────────────────────────────────────────────────

/// Day-of-week as a minute offset into the scheduling week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Minutes from Monday 00:00 to this day's 00:00.
    pub fn offset_minutes(self) -> u32 {
        let days = match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        };
        days * 60 * 24
    }
}

/// Absolute start minute for an interval at `hour:minute` on `day`.
pub fn start_time_in_minutes(day: Day, hour: u32, minute: u32) -> u32 {
    day.offset_minutes() + hour * 60 + minute
}

// ── Scheduler ────────────────────────────────────────────────────────

/// REST client for one room's heating schedule.
pub struct HeatingScheduler {
    http: reqwest::Client,
    base: Url,
    sid: String,
    username: String,
    password: SecretString,
    room_id: String,
}

impl HeatingScheduler {
    pub fn new(
        base: Url,
        sid: String,
        username: String,
        password: SecretString,
        room_id: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base,
            sid,
            username,
            password,
            room_id,
        })
    }

    /// Set the comfort temperature for all of the room's intervals.
    ///
    /// Out-of-range values are rejected before any network call.
    pub async fn set_comfort_temperature(&self, temperature: f64) -> Result<(), Error> {
        if !comfort_in_range(temperature) {
            return Err(Error::TemperatureOutOfRange {
                value: temperature,
                min: MIN_COMFORT_TEMPERATURE,
                max: MAX_COMFORT_TEMPERATURE,
            });
        }

        debug!(room_id = %self.room_id, temperature, "setting comfort temperature");

        let response = self
            .http
            .put(self.room_url()?)
            .query(&[("SID", &self.sid)])
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&json!({ "comfortTemperature": temperature }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    /// Schedule a heating interval; the response carries the new
    /// interval's gateway-assigned id.
    pub async fn add_interval(
        &self,
        day: Day,
        hour: u32,
        minute: u32,
        duration_minutes: u32,
    ) -> Result<serde_json::Value, Error> {
        let url = self.join(&format!("heating/{}/intervals", self.room_id))?;

        debug!(room_id = %self.room_id, ?day, hour, minute, duration_minutes, "adding interval");

        let response = self
            .http
            .post(url)
            .query(&[("SID", &self.sid)])
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&json!({
                "startTimeInMinutes": start_time_in_minutes(day, hour, minute),
                "durationInMinutes": duration_minutes,
            }))
            .send()
            .await?;

        let body = Self::check(response).await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Delete an interval by its gateway id.
    pub async fn delete_interval(&self, interval_id: &str) -> Result<(), Error> {
        let url = self.join(&format!("heating/{}/intervals/{interval_id}", self.room_id))?;

        debug!(room_id = %self.room_id, interval_id, "deleting interval");

        let response = self
            .http
            .delete(url)
            .query(&[("SID", &self.sid)])
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    fn room_url(&self) -> Result<Url, Error> {
        self.join(&format!("heating/{}", self.room_id))
    }

    fn join(&self, suffix: &str) -> Result<Url, Error> {
        Ok(self.base.join(&format!("/heating/api/{suffix}"))?)
    }

    async fn check(response: reqwest::Response) -> Result<String, Error> {
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("gateway rejected credentials (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn day_offsets_step_by_full_days() {
        assert_eq!(Day::Monday.offset_minutes(), 0);
        assert_eq!(Day::Tuesday.offset_minutes(), 1440);
        assert_eq!(Day::Sunday.offset_minutes(), 8640);
    }

    #[test]
    fn tuesday_afternoon_start_minute() {
        assert_eq!(start_time_in_minutes(Day::Tuesday, 14, 30), 2310);
    }

    #[test]
    fn comfort_range_is_inclusive() {
        assert!(comfort_in_range(14.0));
        assert!(comfort_in_range(30.0));
        assert!(comfort_in_range(20.5));
        assert!(!comfort_in_range(13.9));
        assert!(!comfort_in_range(30.1));
    }
}
