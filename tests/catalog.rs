use eegpager::data::catalog::*;
use eegpager::Error;

const INFO: &str = "\
2
/data/rec/Fp1.ncs 1000000000000000 1000000300000000 0 0.5
/data/rec/O1.ncs 1000000001000000 1000000250000000 1 0.5
done
";

#[test]
fn parses_header_channels_and_trailer() {
    let catalog = ChannelCatalog::from_server_info(INFO, 2).unwrap().unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.labels(), vec!["Fp1", "O1"]);
    let o1 = &catalog.channels()[1];
    assert_eq!(o1.path, "/data/rec/O1.ncs");
    assert_eq!(o1.channel_index, 1);
    assert_eq!(o1.units_conversion_factor, 0.5);
}

#[test]
fn session_bounds_are_earliest_start_and_earliest_end() {
    let catalog = ChannelCatalog::from_server_info(INFO, 2).unwrap().unwrap();
    assert_eq!(catalog.start_time(), 1_000_000_000.0);
    assert_eq!(catalog.end_time(), 1_000_000_250.0);
}

#[test]
fn incomplete_file_is_not_ready() {
    let partial = "2\n/data/rec/Fp1.ncs 1 2 0 1.0\n/data/rec/O1.ncs 1 2 1 1.0\n";
    assert_eq!(ChannelCatalog::from_server_info(partial, 2).unwrap(), None);
    assert_eq!(ChannelCatalog::from_server_info("", 1).unwrap(), None);
}

#[test]
fn malformed_channel_line_is_an_error() {
    let bad = "1\n/data/rec/Fp1.ncs start 2 0 1.0\ndone\n";
    let err = ChannelCatalog::from_server_info(bad, 1).unwrap_err();
    assert!(matches!(err, Error::Malformed { .. }));

    assert!(Channel::new("Fp1", 10, 5, 0, 1.0).is_err());
    assert!(Channel::new("", 0, 5, 0, 1.0).is_err());
    assert!(matches!(ChannelCatalog::new(Vec::new()), Err(Error::NoChannels)));
}

#[test]
fn labels_strip_directories_and_extensions() {
    assert_eq!(channel_label("/data/rec/Fp1.ncs"), "Fp1");
    assert_eq!(channel_label("C:\\rec\\T3.mef.seg"), "T3");
    assert_eq!(channel_label("Cz"), "Cz");
}

#[test]
fn microsecond_precision_is_kept() {
    let ch = Channel::new("x", 1_500_000_000_123_456, 1_500_000_001_000_000, 0, 1.0).unwrap();
    assert!((ch.start_time() - 1_500_000_000.123456).abs() < 1e-6);
    assert_eq!(ch.end_time(), 1_500_000_001.0);
}
