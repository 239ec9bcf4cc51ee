//! Helpers for explicit network byte-order conversions.
//!
//! The recognised storage-protocol headers carry their length fields in
//! big-endian byte order. These helpers keep Clippy expectations scoped to
//! the conversion points so the classifier can stay explicit about wire
//! endianness without repeating lint annotations.

/// Parse a 24-bit network-order length from its on-wire representation.
///
/// There is no native 24-bit integer, so the three octets are widened and
/// combined by hand.
///
/// # Examples
///
/// ```
/// use framegate::byte_order::read_network_u24;
///
/// assert_eq!(read_network_u24([0x01, 0x02, 0x03]), 0x0001_0203);
/// ```
#[must_use]
pub fn read_network_u24(bytes: [u8; 3]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use framegate::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}
