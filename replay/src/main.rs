use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use std::time::Instant;
use tcpreasm::{ReassemblyEngine, RecvCtrlBlock, Segment, SegmentOutcome, SocketId};

const CONNECTIONS: usize = 4;
const STREAM_SIZE: usize = 256 * 1024; // 256 KB per connection
const WINDOW: u16 = 8192;
const MSS: usize = 1460;
const LOSS: f64 = 0.15;
const DUPLICATION: f64 = 0.05;
const MAX_ROUNDS: usize = 100_000;
const SEED: u64 = 0x7C9_2EA5;

// Fewer slots than connections
type Engine = ReassemblyEngine<2, 4096, 8>;

/// Sending side of one simulated connection.
struct Peer {
    isn: u32,
    stream: Vec<u8>,
    /// (offset, length) of every segment the sender cuts the stream into
    segments: Vec<(usize, usize)>,
}

impl Peer {
    fn new(rng: &mut StdRng) -> Self {
        // Just below the wrap so every run crosses it
        let isn = 0xFFFF_FFFF - rng.gen_range(0..(STREAM_SIZE as u32 / 2));

        let mut stream = vec![0u8; STREAM_SIZE];
        rng.fill(&mut stream[..]);

        let mut segments = Vec::new();
        let mut offset = 0;
        while offset < STREAM_SIZE {
            let len = rng.gen_range(1..=MSS).min(STREAM_SIZE - offset);
            segments.push((offset, len));
            offset += len;
        }

        Self {
            isn,
            stream,
            segments,
        }
    }

    /// Segments not fully acknowledged that fit in the advertised window.
    fn in_flight(&self, tcb: &RecvCtrlBlock) -> impl Iterator<Item = (usize, usize)> + '_ {
        let acked = tcb.recv_nxt.wrapping_sub(self.isn) as usize;
        let edge = acked + WINDOW as usize;
        self.segments
            .iter()
            .copied()
            .filter(move |&(offset, len)| offset + len > acked && offset < edge)
    }

    fn done(&self, tcb: &RecvCtrlBlock) -> bool {
        tcb.recv_nxt == self.isn.wrapping_add(self.stream.len() as u32)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(SEED);
    let mut engine = Engine::with_defaults();

    let peers: Vec<Peer> = (0..CONNECTIONS).map(|_| Peer::new(&mut rng)).collect();
    let mut tcbs: Vec<RecvCtrlBlock> = peers
        .iter()
        .enumerate()
        .map(|(i, peer)| {
            let remote = SocketAddr::from(([10, 0, 0, i as u8 + 1], 40000 + i as u16));
            RecvCtrlBlock::new(i as SocketId, remote, peer.isn, WINDOW)
        })
        .collect();
    for (i, peer) in peers.iter().enumerate() {
        info!("Connection {}: ISN {:#010x}, {} segments", i, peer.isn, peer.segments.len());
    }

    let mut outputs: Vec<Vec<u8>> = vec![Vec::with_capacity(STREAM_SIZE); CONNECTIONS];
    let mut upper = |socket: SocketId, _: &SocketAddr, data: &[u8]| {
        outputs[socket as usize].extend_from_slice(data);
    };

    info!("Replaying {} connections over {} slots...", CONNECTIONS, engine.pool().slot_count());
    let start = Instant::now();
    let mut rounds = 0;
    let mut sent = 0usize;
    let mut dropped = 0usize;

    while !peers.iter().zip(&tcbs).all(|(peer, tcb)| peer.done(tcb)) {
        rounds += 1;
        if rounds > MAX_ROUNDS {
            error!("No progress after {} rounds", MAX_ROUNDS);
            std::process::exit(1);
        }

        // Interleave all connections in one burst
        let mut burst: Vec<(usize, usize, usize)> = peers
            .iter()
            .zip(&tcbs)
            .enumerate()
            .flat_map(|(i, (peer, tcb))| peer.in_flight(tcb).map(move |(o, l)| (i, o, l)))
            .collect();
        burst.shuffle(&mut rng);

        for (i, offset, len) in burst {
            if rng.gen_bool(LOSS) {
                continue;
            }
            let copies = if rng.gen_bool(DUPLICATION) { 2 } else { 1 };
            for _ in 0..copies {
                let peer = &peers[i];
                let segment = Segment::new(
                    peer.isn.wrapping_add(offset as u32),
                    &peer.stream[offset..offset + len],
                );
                let outcome = engine.receive_segment(&mut tcbs[i], segment, &mut upper);
                sent += 1;
                if let SegmentOutcome::Dropped(_) = outcome {
                    dropped += 1;
                }
                // The application drains immediately
                tcbs[i].recv_wnd = WINDOW;
            }
        }
    }
    let elapsed = start.elapsed();

    let mut ok = true;
    for (i, (peer, output)) in peers.iter().zip(&outputs).enumerate() {
        if *output == peer.stream {
            info!("Connection {}: data matches exactly", i);
        } else {
            error!(
                "Connection {}: data does not match ({} of {} bytes)",
                i,
                output.len(),
                peer.stream.len()
            );
            ok = false;
        }
    }

    let stats = engine.stats();
    let total = (CONNECTIONS * STREAM_SIZE) as f64;
    info!("=== Replay Complete ===");
    info!("Rounds: {}, segments sent: {}, dropped: {}", rounds, sent, dropped);
    info!(
        "In-order: {}, buffered: {}, duplicates: {}",
        stats.in_order_segments, stats.segments_buffered, stats.duplicates
    );
    info!(
        "Pool exhausted: {}, hole list exhausted: {}, truncated bytes: {}",
        stats.pool_exhausted, stats.hole_list_exhausted, stats.bytes_truncated
    );
    info!("Delivered: {} KB in {} calls", stats.bytes_delivered / 1024, stats.deliveries);
    info!("Time: {:.2} seconds", elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", (total / 1024.0) / elapsed.as_secs_f64());

    if !ok {
        std::process::exit(1);
    }
}
