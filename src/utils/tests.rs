use super::error::BridgeError;
use super::logging;

#[test]
fn logging_init_accepts_levels() {
    // try_init makes repeated calls harmless
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_falls_back_to_info() {
    assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
    assert_eq!(logging::parse_level(" trace "), tracing::Level::TRACE);
    assert_eq!(logging::parse_level("verbose"), tracing::Level::INFO);
}

#[test]
fn bind_error_names_the_address() {
    let err = BridgeError::bind(
        "127.0.0.1:8080",
        std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
    );
    let text = err.to_string();
    assert!(text.contains("127.0.0.1:8080"));
    assert!(text.contains("address in use"));
}
