#[cfg(not(feature = "tokio-codec"))]
fn main() {
    eprintln!(
        "Enable the `tokio-codec` feature to build this example:\n    cargo run --example tokio_codec --features tokio-codec"
    );
}

#[cfg(feature = "tokio-codec")]
#[tokio::main(flavor = "current_thread")]
async fn main() -> qcdm_hdlc::Result<()> {
    use futures::StreamExt;
    use qcdm_hdlc::tokio_codec::HdlcCodec;
    use qcdm_hdlc::{encode_frame, ChecksumPolicy, FrameConfig};
    use tokio::io::{duplex, AsyncWriteExt};
    use tokio_util::codec::FramedRead;

    // A log packet followed by a copy with one payload bit flipped in transit.
    let good = encode_frame(&[0x10, 0x00, 0x12, 0x00]);
    let mut corrupted = good.clone();
    corrupted[1] ^= 0x01;

    for policy in [ChecksumPolicy::Report, ChecksumPolicy::Reject] {
        let (mut modem, host) = duplex(1024);
        modem.write_all(&good).await?;
        modem.write_all(&corrupted).await?;
        drop(modem);

        let codec = HdlcCodec::with_config(FrameConfig::default().with_checksum_policy(policy));
        let mut frames = FramedRead::new(host, codec);
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => println!("{policy:?}: {:02X?} {:?}", frame.payload, frame.checksum),
                Err(err) => println!("{policy:?}: rejected: {err}"),
            }
        }
    }

    Ok(())
}
