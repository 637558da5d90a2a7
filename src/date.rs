//! Synthesized timestamps for ingested records, which arrive without any.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Lower edge of every follow-up window, relative to the base timestamp.
fn followup_min_offset() -> Duration {
	Duration::minutes(1)
}

/// Upper edge of the fallback window used when the regular window collapses.
fn fallback_max_offset() -> Duration {
	Duration::hours(1)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
}

/// Returns a timestamp drawn uniformly from `[now - max_days_back days, now]`.
pub fn random_past_timestamp(max_days_back: i64) -> Result<DateTime<Utc>, Error> {
	random_past_timestamp_at(Utc::now(), max_days_back, &mut rand::thread_rng())
}

/// Returns a timestamp strictly after `base`, drawn uniformly from
/// `[base + 1 minute, min(base + max_days_after days, now)]`.
///
/// When that window is empty because `base` is less than a minute old, the
/// draw falls back to `[base + 1 minute, base + 1 hour]`, which may lie
/// past `now`.
pub fn random_followup_timestamp(
	base: DateTime<Utc>,
	max_days_after: i64,
) -> Result<DateTime<Utc>, Error> {
	random_followup_timestamp_at(Utc::now(), base, max_days_after, &mut rand::thread_rng())
}

pub fn random_past_timestamp_at<R: Rng + ?Sized>(
	now: DateTime<Utc>,
	max_days_back: i64,
	rng: &mut R,
) -> Result<DateTime<Utc>, Error> {
	if max_days_back <= 0 {
		return Err(Error::InvalidArgument("max_days_back must be positive"));
	}

	let span = Duration::try_days(max_days_back)
		.ok_or(Error::InvalidArgument("max_days_back is too large"))?;
	let earliest = now
		.checked_sub_signed(span)
		.ok_or(Error::InvalidArgument("max_days_back is too large"))?;

	Ok(uniform_between(earliest, now, rng))
}

pub fn random_followup_timestamp_at<R: Rng + ?Sized>(
	now: DateTime<Utc>,
	base: DateTime<Utc>,
	max_days_after: i64,
	rng: &mut R,
) -> Result<DateTime<Utc>, Error> {
	if max_days_after <= 0 {
		return Err(Error::InvalidArgument("max_days_after must be positive"));
	}

	if base > now {
		return Err(Error::InvalidArgument("base timestamp is in the future"));
	}

	let lower = base + followup_min_offset();
	let upper = Duration::try_days(max_days_after)
		.and_then(|span| base.checked_add_signed(span))
		.map_or(now, |latest| latest.min(now));

	let upper = if upper < lower {
		base + fallback_max_offset()
	} else {
		upper
	};

	Ok(uniform_between(lower, upper, rng))
}

/// Draws a whole-second offset uniformly from `[start, end]`.
fn uniform_between<R: Rng + ?Sized>(
	start: DateTime<Utc>,
	end: DateTime<Utc>,
	rng: &mut R,
) -> DateTime<Utc> {
	let seconds = (end - start).num_seconds();

	start + Duration::seconds(rng.gen_range(0..=seconds))
}

#[cfg(test)]
mod test {
	use chrono::TimeZone;
	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_past_rejects_non_positive_range() {
		let mut rng = StdRng::seed_from_u64(1);

		for days in [0, -1, -365] {
			assert!(matches!(
				random_past_timestamp_at(now(), days, &mut rng),
				Err(Error::InvalidArgument(..))
			));
		}

		assert!(random_past_timestamp(0).is_err());
	}

	#[test]
	fn test_past_stays_within_range() {
		let mut rng = StdRng::seed_from_u64(2);
		let earliest = now() - Duration::days(7);

		for _ in 0..1_000 {
			let date = random_past_timestamp_at(now(), 7, &mut rng).unwrap();

			assert!(date >= earliest);
			assert!(date <= now());
		}
	}

	#[test]
	fn test_followup_is_strictly_after_base() {
		let mut rng = StdRng::seed_from_u64(3);

		for _ in 0..1_000 {
			let base = random_past_timestamp_at(now(), 365, &mut rng).unwrap();
			let date = random_followup_timestamp_at(now(), base, 30, &mut rng).unwrap();

			assert!(date > base);
			assert!(date >= base + Duration::minutes(1));
			assert!(date <= base + Duration::days(30));
			assert!(date <= now() || base > now() - Duration::minutes(1));
		}
	}

	#[test]
	fn test_followup_falls_back_near_now() {
		let mut rng = StdRng::seed_from_u64(4);
		let base = now() - Duration::seconds(10);

		for _ in 0..1_000 {
			let date = random_followup_timestamp_at(now(), base, 30, &mut rng).unwrap();

			assert!(date >= base + Duration::minutes(1));
			assert!(date <= base + Duration::hours(1));
		}

		// a base equal to now is still valid and still moves forward
		let date = random_followup_timestamp_at(now(), now(), 1, &mut rng).unwrap();
		assert!(date > now());
	}

	#[test]
	fn test_followup_rejects_bad_arguments() {
		let mut rng = StdRng::seed_from_u64(5);

		assert_eq!(
			random_followup_timestamp_at(now(), now(), 0, &mut rng),
			Err(Error::InvalidArgument("max_days_after must be positive"))
		);
		assert_eq!(
			random_followup_timestamp_at(now(), now() + Duration::seconds(1), 30, &mut rng),
			Err(Error::InvalidArgument("base timestamp is in the future"))
		);
	}

	#[test]
	fn test_followup_with_live_clock() {
		let base = random_past_timestamp(30).unwrap();

		assert!(random_followup_timestamp(base, 30).unwrap() > base);
	}
}
