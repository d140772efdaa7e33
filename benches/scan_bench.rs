use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use seqscope::analyzer::Analyzer;
use seqscope::parser::Parser;
use seqscope::scanner::Scanner;

const MESSAGES: &[&str] = &[
    "Jan 12 06:49:42 irc sshd[7034]: Failed password for root from 218.161.81.238 port 4228 ssh2",
    "id=firewall time=\"2005-03-18 14:01:43\" fw=TOPSEC priv=4 recorder=kernel type=conn policy=504 proto=TCP rule=deny src=210.82.121.91 sport=4958 dst=61.229.37.85 dport=23124 smac=00:0b:5f:b2:1d:80 dmac=00:04:c1:8b:d8:82",
    "9.26.157.44 - - [16/Jan/2003:21:22:59 -0500] \"GET http://WSsamples HTTP/1.1\" 301 315",
];

fn bench_scan(c: &mut Criterion) {
    let scanner = Scanner::new();
    let bytes: usize = MESSAGES.iter().map(|m| m.len()).sum();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("mixed_messages", |b| {
        b.iter(|| {
            for msg in MESSAGES {
                black_box(scanner.scan(black_box(msg)).unwrap());
            }
        })
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let scanner = Scanner::new();
    let mut parser = Parser::new();
    parser.add(
        &scanner
            .scan("%createtime% %apphost% %appname% : vfs root %action%")
            .unwrap(),
    );
    let seq = scanner
        .scan("may  2 15:51:24 dlfssrv unix: vfs root entry")
        .unwrap();

    c.bench_function("parse/known_pattern", |b| {
        b.iter(|| black_box(parser.parse(black_box(&seq)).unwrap()))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let scanner = Scanner::new();
    let mut analyzer = Analyzer::new();
    for msg in MESSAGES {
        analyzer.add(&scanner.scan(msg).unwrap());
    }
    analyzer.finalize();
    let seq = scanner.scan(MESSAGES[0]).unwrap();

    c.bench_function("analyze/trained_message", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&seq)).unwrap()))
    });
}

criterion_group!(benches, bench_scan, bench_parse, bench_analyze);
criterion_main!(benches);
