//! Test helpers and fixtures for midibridge integration tests
//!
//! Blocks are run by hand through the dummy client, so every test controls
//! exactly when the realtime side runs.

use midibridge::prelude::*;
use midibridge::DummyHandle;

/// Block size used by every test; large enough that frame offsets never clip.
pub const TEST_BLOCK_FRAMES: u32 = 512;

/// Build a bridge with `inputs` input ports and `outputs` output ports.
pub fn test_bridge(inputs: usize, outputs: usize) -> (RealtimeBridge<Dummy>, DummyHandle) {
    let mut builder = RealtimeBridge::<Dummy>::builder().client_name("midibridge-test");
    for i in 0..inputs {
        builder = builder.input_port(format!("in_{}", i + 1));
    }
    for i in 0..outputs {
        builder = builder.output_port(format!("out_{}", i + 1));
    }
    build(builder)
}

/// Build a bridge from a prepared builder.
pub fn build(builder: BridgeBuilder<Dummy>) -> (RealtimeBridge<Dummy>, DummyHandle) {
    let options = DummyOptions::new();
    let device = options.handle();
    let bridge = builder.build(options).expect("Failed to create test bridge");
    (bridge, device)
}

/// Push raw messages onto input `port` and run one block.
pub fn feed(device: &DummyHandle, port: usize, messages: &[&[u8]]) {
    for bytes in messages {
        assert!(device.push_input(port, bytes), "no input port {}", port);
    }
    assert!(device.run_block(TEST_BLOCK_FRAMES), "client not active");
}
