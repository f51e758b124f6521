//! uplink — a handful of terminals contending for a shared return link.
//!
//! Every terminal runs its own `RandomAccess` scheduler with its own random
//! stream and a toy transmit queue.  Each block every terminal evaluates one
//! trigger on the same allocation channel; the driver then counts how many
//! transmitted packets had at least one collision-free replica (the first
//! step of successive interference cancellation).
//!
//! Run with:
//!   cargo run -p uplink --release
//!   cargo run -p uplink --release -- channels.csv
//!   RUST_LOG=ra_engine=debug cargo run -p uplink

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use ra_config::{
    AllocationChannelConfig, RandomAccessConfig, SlottedAlohaConfig, load_channels_csv,
    load_channels_reader,
};
use ra_core::{
    AccessModel, AllocationChannelId, Opportunity, RandomSource, TerminalId, TerminalRng,
    TriggerKind,
};
use ra_engine::{FixedUplink, RandomAccess};

// ── Constants ─────────────────────────────────────────────────────────────────

const TERMINAL_COUNT:       u32 = 6;
const SEED:                 u64 = 42;
const BLOCKS:               u64 = 400;
/// Every Nth block the terminals fire a Slotted ALOHA trigger instead of CRDSA.
const SLOTTED_ALOHA_PERIOD: u64 = 4;
/// Terminal 0 holds a DAMA grant one block in N.
const DAMA_PERIOD:          u64 = 25;
const ARRIVAL_PROBABILITY:  f64 = 0.6;
const MIN_PACKET_BYTES:     u32 = 40;
const MAX_PACKET_BYTES:     u32 = 1_500;
const MAX_QUEUE_LEN:        usize = 32;

// Two CRDSA channels: a wide one for large payloads and a narrow one for
// small payloads with a little more load control.
const CHANNELS_CSV: &str = "\
channel_id,backoff_probability,max_backoff_probability,backoff_time_blocks,payload_bytes,min_randomization_value,max_randomization_value,num_of_instances,max_unique_payload_per_block,max_consecutive_blocks_accessed,min_idle_blocks\n\
0,0.05,0.2,2,1200,0,79,3,3,6,2\n\
1,0.1,0.3,3,600,0,39,2,4,4,1\n\
";

// ── Terminal ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Stats {
    none:          u64,
    slotted_aloha: u64,
    crdsa:         u64,
    packets_sent:  u64,
    packets_clean: u64,
}

struct Terminal {
    scheduler: RandomAccess,
    rng:       TerminalRng,
    uplink:    FixedUplink,
    stats:     Stats,
}

impl Terminal {
    fn new(id: TerminalId, config: RandomAccessConfig) -> Result<Self> {
        Ok(Self {
            scheduler: RandomAccess::new(config)?,
            rng:       TerminalRng::new(SEED, id),
            uplink:    FixedUplink::new(),
            stats:     Stats::default(),
        })
    }

    fn enqueue_arrivals(&mut self) {
        if self.uplink.packet_sizes.len() >= MAX_QUEUE_LEN {
            return;
        }
        if self.rng.draw_real01() < ARRIVAL_PROBABILITY {
            let size = self.rng.draw_int(MIN_PACKET_BYTES, MAX_PACKET_BYTES);
            self.uplink.packet_sizes.push(size);
        }
    }

    /// Remove up to `n` queued packets no longer than `max_bytes`, oldest first.
    fn take_packets(&mut self, max_bytes: u32, n: usize) {
        let mut taken = 0;
        self.uplink.packet_sizes.retain(|&size| {
            if taken < n && size <= max_bytes {
                taken += 1;
                false
            } else {
                true
            }
        });
    }
}

/// One transmission this block, as seen by the receiver.
enum Sent {
    SlottedAloha { terminal: usize, slot: u32 },
    Crdsa { terminal: usize, slot_sets: Vec<BTreeSet<u32>> },
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    println!("=== uplink — contention random access ===");
    println!("Terminals: {TERMINAL_COUNT}  |  Blocks: {BLOCKS}  |  Seed: {SEED}");
    println!();

    // 1. Channel table: from the command line, or the embedded default.
    let channels: Vec<AllocationChannelConfig> = match std::env::args().nth(1) {
        Some(path) => load_channels_csv(Path::new(&path))?,
        None => load_channels_reader(Cursor::new(CHANNELS_CSV))?,
    };
    println!("Loaded {} allocation channels", channels.len());

    let config = RandomAccessConfig::new(
        AccessModel::AnyAvailable,
        SlottedAlohaConfig {
            control_randomization_interval: 50.0,
            payload_bytes:                  Some(MAX_PACKET_BYTES),
        },
        channels,
    );
    let channel_count = config.channel_count() as u64;

    // 2. One scheduler per terminal.
    let mut terminals = (0..TERMINAL_COUNT)
        .map(|i| Terminal::new(TerminalId(i), config.clone()))
        .collect::<Result<Vec<_>>>()?;

    // 3. Block loop.
    for block in 0..BLOCKS {
        let channel = AllocationChannelId((block % channel_count) as u32);
        let trigger = if block % SLOTTED_ALOHA_PERIOD == 0 {
            TriggerKind::SlottedAloha
        } else {
            TriggerKind::Crdsa
        };

        let mut sent = Vec::new();
        for (i, t) in terminals.iter_mut().enumerate() {
            t.enqueue_arrivals();
            t.uplink.dama_available = i == 0 && block % DAMA_PERIOD == 0;

            let op = t.scheduler.evaluate(channel, trigger, &t.uplink, &mut t.rng)?;
            match op.opportunity {
                Opportunity::None => t.stats.none += 1,
                Opportunity::SlottedAloha { release_slot } => {
                    t.stats.slotted_aloha += 1;
                    t.take_packets(MAX_PACKET_BYTES, 1);
                    sent.push(Sent::SlottedAloha { terminal: i, slot: release_slot });
                }
                Opportunity::Crdsa { slot_sets } => {
                    t.stats.crdsa += 1;
                    let max_bytes = t.scheduler.channel(channel)?.config().payload_bytes;
                    t.take_packets(max_bytes, slot_sets.len());
                    sent.push(Sent::Crdsa { terminal: i, slot_sets });
                }
            }
        }

        resolve_block(&sent, &mut terminals);
    }

    // 4. Summary.
    println!();
    println!(
        "{:>8}  {:>6}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
        "terminal", "none", "s-aloha", "crdsa", "sent", "clean", "queued"
    );
    let mut total_sent = 0;
    let mut total_clean = 0;
    for (i, t) in terminals.iter().enumerate() {
        let s = &t.stats;
        println!(
            "{:>8}  {:>6}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}",
            i,
            s.none,
            s.slotted_aloha,
            s.crdsa,
            s.packets_sent,
            s.packets_clean,
            t.uplink.packet_sizes.len()
        );
        total_sent += s.packets_sent;
        total_clean += s.packets_clean;
    }
    let ratio = if total_sent == 0 { 0.0 } else { total_clean as f64 / total_sent as f64 };
    println!();
    println!("Packets with a clean replica: {total_clean}/{total_sent} ({:.1}%)", ratio * 100.0);

    if let Some(t) = terminals.first() {
        t.scheduler.log_variables();
    }
    Ok(())
}

/// Count, per transmitted packet, whether any of its replicas landed in a
/// slot nobody else used this block.
fn resolve_block(sent: &[Sent], terminals: &mut [Terminal]) {
    let mut aloha_use: BTreeMap<u32, u32> = BTreeMap::new();
    let mut crdsa_use: BTreeMap<u32, u32> = BTreeMap::new();
    for s in sent {
        match s {
            Sent::SlottedAloha { slot, .. } => *aloha_use.entry(*slot).or_default() += 1,
            Sent::Crdsa { slot_sets, .. } => {
                for &slot in slot_sets.iter().flatten() {
                    *crdsa_use.entry(slot).or_default() += 1;
                }
            }
        }
    }

    for s in sent {
        match s {
            Sent::SlottedAloha { terminal, slot } => {
                let stats = &mut terminals[*terminal].stats;
                stats.packets_sent += 1;
                if aloha_use.get(slot) == Some(&1) {
                    stats.packets_clean += 1;
                }
            }
            Sent::Crdsa { terminal, slot_sets } => {
                let stats = &mut terminals[*terminal].stats;
                for set in slot_sets {
                    stats.packets_sent += 1;
                    if set.iter().any(|slot| crdsa_use.get(slot) == Some(&1)) {
                        stats.packets_clean += 1;
                    }
                }
            }
        }
    }
}
