//! Wire encoding/decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use remotecl_protocol::packet::Packet;
use remotecl_protocol::packets::kernel::EnqueueKernel;
use remotecl_protocol::packets::IdListPacket;
use remotecl_protocol::payload::Payload;
use remotecl_protocol::ByteStream;

fn duplex_pair(capacity: usize) -> (ByteStream, ByteStream) {
    let (a, b) = tokio::io::duplex(capacity);
    let (ar, aw) = tokio::io::split(a);
    let (br, bw) = tokio::io::split(b);
    (
        ByteStream::from_parts(Box::new(ar), Box::new(aw)),
        ByteStream::from_parts(Box::new(br), Box::new(bw)),
    )
}

fn bench_payload_roundtrip(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("payload_roundtrip");

    for size in [256usize, 4096, 65536] {
        let data = vec![0x42u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                runtime.block_on(async {
                    let (mut tx, mut rx) = duplex_pair(size * 2 + 64);
                    let payload: Payload = Payload::new(data.clone());
                    payload.write_body(&mut tx).await.unwrap();
                    tx.flush().await.unwrap();
                    let got: Payload = Payload::read_body(&mut rx).await.unwrap();
                    black_box(got)
                })
            });
        });
    }

    group.finish();
}

fn bench_command_encode(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let packet = EnqueueKernel {
        kernel: 9,
        queue: 3,
        work_dim: 3,
        global_size: [1024, 1024, 4],
        global_offset: [0, 0, 0],
        local_size: [8, 8, 1],
        want_event: true,
        expect_event_list: false,
    };

    c.bench_function("enqueue_kernel_encode", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let (mut tx, _rx) = duplex_pair(1024);
                packet.write_body(&mut tx).await.unwrap();
                tx.flush().await.unwrap();
                black_box(())
            })
        });
    });
}

fn bench_id_list_roundtrip(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("id_list_roundtrip");

    for count in [1usize, 16, 255] {
        let packet = IdListPacket {
            ids: (1..=count as u16).collect(),
        };

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &packet, |b, packet| {
            b.iter(|| {
                runtime.block_on(async {
                    let (mut tx, mut rx) = duplex_pair(4096);
                    packet.write_body(&mut tx).await.unwrap();
                    tx.flush().await.unwrap();
                    let got = IdListPacket::read_body(&mut rx).await.unwrap();
                    black_box(got)
                })
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_payload_roundtrip,
    bench_command_encode,
    bench_id_list_roundtrip,
);

criterion_main!(benches);
