use qcdm_hdlc::{decode_frame, encode_frame, Result};

fn main() -> Result<()> {
    // DIAG version info request.
    let payload = [0x00, 0x78, 0xF0, 0x7E];
    let frame = encode_frame(&payload);
    println!("Encoded frame bytes: {frame:02X?}");

    let decoded = decode_frame(&frame)?;
    println!("Checksum: {:?}", decoded.checksum);
    println!("Decoded payload: {:02X?}", decoded.into_verified()?);
    Ok(())
}
