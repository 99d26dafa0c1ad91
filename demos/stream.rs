use qcdm_hdlc::{FrameReader, Result, BOUNDARY};
use std::io::Cursor;

fn main() -> Result<()> {
    // Modems usually terminate frames without sending a leading marker.
    // Each frame body is payload plus the little-endian checksum, escaped.
    let captured = [
        &[0x00, 0x78, 0xF0, 0x7D, 0x5E, 0x35, 0x5C][..],
        &[BOUNDARY],
        &[0x0C, 0x14, 0x42, 0xF0][..],
        &[BOUNDARY],
        // Capture stopped mid-frame.
        &[0x4B, 0x12][..],
    ]
    .concat();

    let mut reader = FrameReader::new(Cursor::new(captured));
    loop {
        match reader.read_frame() {
            Ok(Some(frame)) => println!("{:02X?} {:?}", frame.payload, frame.checksum),
            Ok(None) => break,
            Err(err) => {
                println!("stream ended: {err}");
                break;
            }
        }
    }
    let tail = reader.take_remainder();
    println!("unterminated bytes kept: {:02X?}", tail.escaped);
    Ok(())
}
