//! Micro-benchmark: raw push->pop latency and throughput for
//! `kplex_queue::BoundedQueue`, compared against `crossbeam-channel` and
//! `std::sync::mpsc` bounded channels under the same producer/consumer
//! load.
//!
//! Measurement window:
//! - Starts when producers are released by a barrier.
//! - Stops once the aggregator has collected exactly `n_items` latencies.
//! - Shutdown (poison pills) happens outside the window.
//!
//! Output CSV:
//! impl,producers,consumers,n_items,capacity,p50_ns,p95_ns,p99_ns,throughput_items_per_s
//!
//! Run (release build recommended):
//!   target/release/kplex-bench --implm kplex --producers 4 --consumers 4 --n-items 200000 --capacity 1024
//!   target/release/kplex-bench --implm xbeam --producers 4 --consumers 4 --n-items 200000 --capacity 1024
//!   target/release/kplex-bench --implm mpsc  --producers 4 --consumers 4 --n-items 200000 --capacity 1024

use std::sync::{mpsc as stdmpsc, Arc, Barrier, Mutex};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossbeam_channel as xbeam;
use kplex_queue::BoundedQueue;

#[derive(Parser, Debug, Clone)]
struct Args {
    /// "kplex" | "xbeam" | "mpsc"
    #[arg(long, default_value = "kplex")]
    implm: String,

    #[arg(long, default_value_t = 4)]
    producers: usize,

    #[arg(long, default_value_t = 4)]
    consumers: usize,

    /// total items (Data messages) to measure
    #[arg(long, default_value_t = 200_000)]
    n_items: usize,

    /// queue depth / capacity
    #[arg(long, default_value_t = 1024)]
    capacity: usize,
}

#[derive(Clone)]
struct Stamp {
    t: Instant,
}

/// Unified message so poison pills never pollute the latency metrics.
#[derive(Clone)]
enum Msg {
    Data(Stamp),
    Stop,
}

trait QueueAdapter: Send + Sync + 'static {
    fn enqueue_data(&self, m: Msg);
    fn dequeue(&self) -> Msg;
}

// `BoundedQueue` sheds its oldest pending item under pressure rather than
// blocking the producer (§3's drop-oldest policy); this benchmark still
// compares it head-to-head against channels that block, since that
// back-pressure behavior is exactly the tradeoff kplex makes.
struct KplexAdapter {
    q: BoundedQueue<Msg>,
}
impl QueueAdapter for KplexAdapter {
    fn enqueue_data(&self, m: Msg) {
        self.q.push(m);
    }
    fn dequeue(&self) -> Msg {
        self.q.pop().unwrap_or(Msg::Stop)
    }
}

struct XBeamAdapter {
    tx: xbeam::Sender<Msg>,
    rx: xbeam::Receiver<Msg>,
}
impl QueueAdapter for XBeamAdapter {
    fn enqueue_data(&self, m: Msg) {
        self.tx.send(m).unwrap();
    }
    fn dequeue(&self) -> Msg {
        self.rx.recv().unwrap()
    }
}

struct MpscAdapter {
    tx: stdmpsc::SyncSender<Msg>,
    rx: Mutex<stdmpsc::Receiver<Msg>>,
}
impl QueueAdapter for MpscAdapter {
    fn enqueue_data(&self, m: Msg) {
        self.tx.send(m).unwrap();
    }
    fn dequeue(&self) -> Msg {
        let rx = self.rx.lock().unwrap();
        rx.recv().unwrap()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let adapter: Box<dyn QueueAdapter> = match args.implm.as_str() {
        "kplex" => Box::new(KplexAdapter {
            q: BoundedQueue::new(args.capacity)?,
        }),
        "xbeam" => {
            let (tx, rx) = xbeam::bounded::<Msg>(args.capacity);
            Box::new(XBeamAdapter { tx, rx })
        }
        "mpsc" => {
            let (tx, rx) = stdmpsc::sync_channel::<Msg>(args.capacity);
            Box::new(MpscAdapter {
                tx,
                rx: Mutex::new(rx),
            })
        }
        other => {
            eprintln!("Unknown --implm={other}. Use 'kplex' | 'xbeam' | 'mpsc'.");
            std::process::exit(2);
        }
    };
    let q = Arc::new(adapter);

    let start_barrier = Arc::new(Barrier::new(args.producers + 1));
    let (lat_tx, lat_rx) = xbeam::unbounded::<u64>();

    let mut consumer_handles = Vec::with_capacity(args.consumers);
    for _ in 0..args.consumers {
        let q = Arc::clone(&q);
        let lat_tx = lat_tx.clone();
        consumer_handles.push(thread::spawn(move || {
            while let Msg::Data(stamp) = q.dequeue() {
                let ns = stamp.t.elapsed().as_nanos() as u64;
                let _ = lat_tx.send(ns);
            }
        }));
    }

    let base = args.n_items / args.producers;
    let extra = args.n_items % args.producers;

    let mut producers = Vec::with_capacity(args.producers);
    for pid in 0..args.producers {
        let q = Arc::clone(&q);
        let n = base + if pid < extra { 1 } else { 0 };
        let sb = Arc::clone(&start_barrier);
        producers.push(thread::spawn(move || {
            sb.wait();
            for _ in 0..n {
                q.enqueue_data(Msg::Data(Stamp { t: Instant::now() }));
            }
        }));
    }

    let t0 = Instant::now();
    start_barrier.wait();

    let mut lats = Vec::with_capacity(args.n_items);
    for _ in 0..args.n_items {
        lats.push(lat_rx.recv().unwrap());
    }
    let elapsed = t0.elapsed();

    for _ in 0..args.consumers {
        q.enqueue_data(Msg::Stop);
    }
    for h in producers {
        h.join().unwrap();
    }
    for h in consumer_handles {
        h.join().unwrap();
    }

    lats.sort_unstable();
    let p50 = percentile(&lats, 50.0);
    let p95 = percentile(&lats, 95.0);
    let p99 = percentile(&lats, 99.0);
    let tps = args.n_items as f64 / elapsed.as_secs_f64();

    println!("impl,producers,consumers,n_items,capacity,p50_ns,p95_ns,p99_ns,throughput_items_per_s");
    println!(
        "{},{},{},{},{},{},{},{},{}",
        args.implm,
        args.producers,
        args.consumers,
        args.n_items,
        args.capacity,
        p50 as u64,
        p95 as u64,
        p99 as u64,
        tps as u64
    );

    Ok(())
}

fn percentile(sorted_ns: &[u64], p: f64) -> f64 {
    if sorted_ns.is_empty() {
        return 0.0;
    }
    let n = sorted_ns.len();
    let rank = ((p / 100.0) * (n as f64 - 1.0)).round() as usize;
    sorted_ns[rank] as f64
}
