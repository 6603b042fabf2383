use auto_impl::auto_impl;

/// The transport side of the encoder.
///
/// Each call receives one complete packet payload (row, column definition or status packet).
/// Adding the length/sequence header, splitting large payloads, compression and the socket
/// write all happen behind this trait.
#[auto_impl(&mut, Box)]
pub trait ByteSink {
    /// Queue one packet payload
    fn write_packet(&mut self, payload: &[u8]) -> std::io::Result<()>;

    /// Push queued packets to the client. Called after every status packet.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A sink that keeps every packet in memory
#[derive(Debug, Default)]
pub struct PacketCollector {
    packets: Vec<Vec<u8>>,
    flushes: usize,
}

impl PacketCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> &[Vec<u8>] {
        &self.packets
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.packets.last().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Number of `flush` calls seen so far
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Take the collected packets, leaving the collector empty
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.packets)
    }
}

impl ByteSink for PacketCollector {
    fn write_packet(&mut self, payload: &[u8]) -> std::io::Result<()> {
        self.packets.push(payload.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
