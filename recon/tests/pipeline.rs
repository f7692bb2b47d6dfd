use ndarray::Array3;
use num_complex::Complex32;
use mr_data::kspace::KSpace;
use mr_data::sample_block::RawSampleBlock;
use mr_data::session::{AcquisitionSession, SurplusPolicy, Trajectory};
use mr_data::stream::SampleStreamAssembler;
use mr_data::trajectory::TrajectoryMapper;
use recon::engine::ReconstructionEngine;
use utils::Config;

/// 64 blocks, block k holding the constant k, fed through the wire path in odd-sized chunks
#[test]
fn constant_rows_reconstruct_to_a_centered_peak() {
    let mut session = AcquisitionSession::new(Trajectory::CartesianFull,64);
    session.block_samples = 200;
    session.surplus = SurplusPolicy::Carry;
    let mut assembler = SampleStreamAssembler::for_session(&session);
    let mut mapper = TrajectoryMapper::new(session.clone()).unwrap();

    let mut wire = vec![];
    for k in 0..64 {
        let block = RawSampleBlock::from_samples(&vec![Complex32::new(k as f32,0.0);200],k);
        wire.extend_from_slice(block.as_bytes());
    }

    let mut kspace = None;
    for chunk in wire.chunks(977) {
        for block in assembler.on_bytes_available(chunk).unwrap() {
            if let Some(k) = mapper.place_block(&block).unwrap() {
                kspace = Some(k);
            }
        }
    }
    let kspace = kspace.expect("a full pass of k-space");
    for k in 0..64 {
        assert!(kspace.row(0,k).iter().all(|v| *v == Complex32::new(k as f32,0.0)));
    }

    let engine = ReconstructionEngine::new(Config::default());
    let img = engine.reconstruct(&session,&kspace).unwrap();
    let (at,value) = img.peak();
    assert_eq!(at,(0,32,32));
    // sum of all samples over sqrt(64*64)
    assert!((value - 2016.0).abs() < 0.5);
}

#[test]
fn unit_kspace_peaks_at_matrix_size() {
    let session = AcquisitionSession::new(Trajectory::CartesianFull,64);
    let kspace = KSpace::from_array(Array3::from_elem((1,64,64),Complex32::new(1.0,0.0)));
    let img = ReconstructionEngine::new(Config::default()).reconstruct(&session,&kspace).unwrap();
    let (at,value) = img.peak();
    assert_eq!(at,(0,32,32));
    assert!((value - 64.0).abs() < 1E-2);
    // nothing leaks out of the DC term
    assert!(img.magnitude.iter().filter(|m| **m > 1E-2).count() == 1);
}
