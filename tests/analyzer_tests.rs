use seqscope::analyzer::Analyzer;
use seqscope::error::Error;
use seqscope::scanner::Scanner;
use seqscope::sequence::Sequence;

const SSHD_SAMPLES: &[&str] = &[
    "Jan 12 06:49:42 irc sshd[7034]: Failed password for root from 218.161.81.238 port 4228 ssh2",
    "Jan 12 06:49:42 irc sshd[7034]: Accepted password for root from 218.161.81.238 port 4228 ssh2",
    "Jan 12 14:44:48 jlz sshd[11084]: Accepted publickey for jlz from 76.21.0.16 port 36609 ssh2",
];

const SSHD_PATTERN: &str = "%ts% %string% sshd [ %integer% ] : %string% %string% for %string% from %ipv4% port %integer% ssh2";

const KEY_VALUE_SAMPLES: &[&str] = &[
    "id=firewall time=\"2005-03-18 14:01:46\" fw=TOPSEC priv=6 recorder=kernel type=conn policy=414 proto=TCP rule=accept src=61.167.71.244 sport=35223 dst=210.82.119.211 dport=25 duration=27 inpkt=37 outpkt=39 sent=1770 rcvd=20926 smac=00:04:c1:8b:d8:82 dmac=00:0b:5f:b2:1d:80",
    "id=firewall time=\"2005-03-18 14:01:43\" fw=TOPSEC priv=4 recorder=kernel type=conn policy=504 proto=TCP rule=deny src=210.82.121.91 sport=4958 dst=61.229.37.85 dport=23124 smac=00:0b:5f:b2:1d:80 dmac=00:04:c1:8b:d8:82",
];

const KEY_VALUE_PATTERNS: &[&str] = &[
    "id = %string% time = \" %ts% \" fw = %string% priv = %integer% recorder = %string% type = %string% policy = %integer% proto = %string% rule = %string% src = %ipv4% sport = %integer% dst = %ipv4% dport = %integer% duration = %integer% inpkt = %integer% outpkt = %integer% sent = %integer% rcvd = %integer% smac = %mac% dmac = %mac%",
    "id = %string% time = \" %ts% \" fw = %string% priv = %integer% recorder = %string% type = %string% policy = %integer% proto = %string% rule = %string% src = %ipv4% sport = %integer% dst = %ipv4% dport = %integer% smac = %mac% dmac = %mac%",
];

fn scan(msg: &str) -> Sequence {
    Scanner::new().scan(msg).expect("message scans")
}

fn trained(samples: &[&str]) -> Analyzer {
    let mut analyzer = Analyzer::new();
    for sample in samples {
        analyzer.add(&scan(sample));
    }
    analyzer.finalize();
    analyzer
}

#[test]
fn sibling_literals_merge_into_strings() {
    let analyzer = trained(SSHD_SAMPLES);
    for sample in SSHD_SAMPLES {
        let out = analyzer.analyze(&scan(sample)).expect("analyzes");
        assert_eq!(out.to_string(), SSHD_PATTERN, "sample: {sample}");
    }
}

#[test]
fn surface_values_survive_analysis() {
    let analyzer = trained(SSHD_SAMPLES);
    let out = analyzer.analyze(&scan(SSHD_SAMPLES[2])).unwrap();
    assert_eq!(out[1].value, "jlz");
    assert_eq!(out[12].value, "76.21.0.16");
    assert_eq!(out[14].value, "36609");
}

#[test]
fn key_value_samples_keep_their_keys() {
    let analyzer = trained(KEY_VALUE_SAMPLES);
    for (sample, pattern) in KEY_VALUE_SAMPLES.iter().zip(KEY_VALUE_PATTERNS) {
        let out = analyzer.analyze(&scan(sample)).expect("analyzes");
        assert_eq!(&out.to_string(), pattern, "sample: {sample}");
    }
}

#[test]
fn analysis_is_idempotent() {
    let analyzer = trained(SSHD_SAMPLES);
    for sample in SSHD_SAMPLES {
        let once = analyzer.analyze(&scan(sample)).unwrap();
        let twice = analyzer.analyze(&once).unwrap();
        assert_eq!(once.to_string(), twice.to_string());
    }
}

#[test]
fn unrelated_message_does_not_match() {
    let analyzer = trained(SSHD_SAMPLES);
    let seq = scan("completely unrelated message");
    assert!(matches!(analyzer.analyze(&seq), Err(Error::NoMatch)));
}

#[test]
fn shorter_prefix_does_not_match() {
    let analyzer = trained(SSHD_SAMPLES);
    // A proper prefix of a trained message reaches no leaf.
    let seq = scan("Jan 12 06:49:42 irc sshd[7034]: Failed password");
    assert!(matches!(analyzer.analyze(&seq), Err(Error::NoMatch)));
}

#[test]
fn signature_of_sshd_sample() {
    assert_eq!(
        scan(SSHD_SAMPLES[0]).signature(),
        "%ts%[%integer%]:%ipv4%%integer%"
    );
}

#[test]
#[should_panic(expected = "frozen")]
fn add_after_finalize_panics() {
    let mut analyzer = trained(SSHD_SAMPLES);
    analyzer.add(&scan(SSHD_SAMPLES[0]));
}

#[test]
#[should_panic(expected = "finalized")]
fn analyze_before_finalize_panics() {
    let mut analyzer = Analyzer::new();
    analyzer.add(&scan(SSHD_SAMPLES[0]));
    let _ = analyzer.analyze(&scan(SSHD_SAMPLES[0]));
}
