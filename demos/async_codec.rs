#[cfg(not(feature = "async-codec"))]
fn main() {
    eprintln!(
        "Enable the `async-codec` feature to build this example:\n    cargo run --example async_codec --features async-codec"
    );
}

#[cfg(feature = "async-codec")]
fn main() -> qcdm_hdlc::Result<()> {
    use asynchronous_codec::{FramedRead, FramedWrite};
    use futures::{executor::block_on, io::Cursor, sink::SinkExt, stream::StreamExt};
    use qcdm_hdlc::async_codec::HdlcCodec;
    use qcdm_hdlc::{BOUNDARY, ESCAPE};

    // Payloads that collide with the reserved bytes, in the body and in the checksum.
    let payloads = [vec![0x1D, BOUNDARY, 0x00, ESCAPE], vec![0x60]];

    block_on(async move {
        let mut writer = FramedWrite::new(Cursor::new(Vec::new()), HdlcCodec::new());
        for payload in &payloads {
            writer.send(payload.clone()).await?;
        }
        let wire = writer.into_inner().into_inner();
        for (i, chunk) in wire.split(|&b| b == BOUNDARY).filter(|c| !c.is_empty()).enumerate() {
            println!("frame {i} on the wire: 7E {chunk:02X?} 7E");
        }

        let mut reader = FramedRead::new(Cursor::new(wire), HdlcCodec::new());
        while let Some(frame) = reader.next().await.transpose()? {
            println!("decoded: {:02X?}", frame.into_verified()?);
        }
        Ok(())
    })
}
