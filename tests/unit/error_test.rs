//! Tests for error types

use geolease::core::SchedulerError;

#[test]
fn test_error_display() {
    let err = SchedulerError::InvalidState("double release".into());
    assert_eq!(err.to_string(), "invalid state: double release");

    let err = SchedulerError::UnknownSet("ghosts".into());
    assert_eq!(err.to_string(), "unknown account set: ghosts");

    let err = SchedulerError::InvalidGeometry("2 vertices".into());
    assert_eq!(err.to_string(), "invalid geometry: 2 vertices");
}

#[test]
fn test_parse_error_display() {
    let err = SchedulerError::Parse {
        origin: "forbidden".into(),
        line: 3,
        message: "expected `lat,lon`".into(),
    };
    assert_eq!(
        err.to_string(),
        "parse error in forbidden at line 3: expected `lat,lon`"
    );
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: SchedulerError = io.into();
    assert!(matches!(err, SchedulerError::Io(_)));
    assert!(err.to_string().contains("gone"));
}

#[test]
fn test_error_into_anyhow() {
    fn fails() -> geolease::core::AppResult<()> {
        let result: Result<(), SchedulerError> = Err(SchedulerError::InvalidConfig("speed".into()));
        result?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
