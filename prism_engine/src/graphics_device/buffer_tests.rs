//! Unit tests for buffer.rs

use crate::graphics_device::BufferFormat;
use crate::error::Error;

// ============================================================================
// FORMAT WHITELIST
// ============================================================================

#[test]
fn test_parse_whitelisted_formats() {
    assert_eq!("R32G32_SFLOAT".parse::<BufferFormat>().unwrap(), BufferFormat::R32G32_SFLOAT);
    assert_eq!("R32G32B32_SFLOAT".parse::<BufferFormat>().unwrap(), BufferFormat::R32G32B32_SFLOAT);
    assert_eq!(
        "R32G32B32A32_SFLOAT".parse::<BufferFormat>().unwrap(),
        BufferFormat::R32G32B32A32_SFLOAT
    );
    assert_eq!("R8G8B8A8_UNORM".parse::<BufferFormat>().unwrap(), BufferFormat::R8G8B8A8_UNORM);
}

#[test]
fn test_parse_vk_prefixed_name() {
    let format: BufferFormat = "VK_FORMAT_R32G32B32_SFLOAT".parse().unwrap();
    assert_eq!(format, BufferFormat::R32G32B32_SFLOAT);
}

#[test]
fn test_parse_unknown_format_is_validation_error() {
    for bad in ["R16G16_SFLOAT", "r32g32b32_sfloat", "", "VK_FORMAT_"] {
        let err = bad.parse::<BufferFormat>().unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)), "{} accepted", bad);
    }
}

#[test]
fn test_display_round_trips_through_parse() {
    for format in [
        BufferFormat::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT,
        BufferFormat::R8G8B8A8_UNORM,
    ] {
        assert_eq!(format.to_string().parse::<BufferFormat>().unwrap(), format);
    }
}

#[test]
fn test_format_sizes() {
    assert_eq!(BufferFormat::R32G32_SFLOAT.size(), 8);
    assert_eq!(BufferFormat::R32G32B32_SFLOAT.size(), 12);
    assert_eq!(BufferFormat::R32G32B32A32_SFLOAT.size(), 16);
    assert_eq!(BufferFormat::R8G8B8A8_UNORM.size(), 4);
}
