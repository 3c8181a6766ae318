/// In-process test doubles
///
/// [`MockBeacon`] stands in for a randomness beacon: rounds advance only when the test
/// says so, every call is counted, and outages can be switched on and off.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use common::testkit::MockBeacon;
///
/// #[tokio::test]
/// async fn test_unlock_after_round() -> Result<(), Box<dyn std::error::Error>> {
///     let beacon = Arc::new(MockBeacon::new(1000, 30));
///     let vault = TimeVault::new(beacon.clone(), Arc::new(RsaCustodian::default()));
///
///     let sealed = vault.seal(b"hi", Utc::now() + Duration::seconds(65), None).await?;
///     beacon.advance_to(sealed.round);
///
///     let state = vault.unlock(&sealed.into(), None).await?;
///     assert_eq!(state.plaintext(), Some(&b"hi"[..]));
///     Ok(())
/// }
/// ```
mod beacon;

pub use beacon::{BeaconCalls, MockBeacon, FIXTURE_PUBLIC_KEY};
