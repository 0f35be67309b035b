use matrix_util::common_io::create_temp_dir_file;
use matrix_util::mtx_io::{read_mtx_triplets, write_mtx_triplets};
use matrix_util::traits::{IoOps, MatTriplets, SampleOps};
use nalgebra_sparse::CsrMatrix;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn ndarray_io_test() -> anyhow::Result<()> {
    let mut rng = SmallRng::seed_from_u64(7);
    let xx = ndarray::Array2::<f64>::rgamma(50, 20, (2.0, 0.5), &mut rng)?;

    let tsv_file = create_temp_dir_file("txt.gz")?;
    xx.to_tsv(tsv_file.to_str().unwrap())?;

    let yy = ndarray::Array2::<f64>::from_tsv(tsv_file.to_str().unwrap(), None)?;

    assert_eq!(xx, yy);

    Ok(())
}

#[test]
fn ndarray_csv_with_header_test() -> anyhow::Result<()> {
    let xx = ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];

    let csv_file = create_temp_dir_file("csv")?;
    let csv_name = csv_file.to_str().unwrap();
    matrix_util::common_io::write_lines(&["a,b,c".to_string(), "1,2,3".into(), "4,5,6".into()], csv_name)?;

    let yy = ndarray::Array2::<f64>::read_file_delim(csv_name, ",", Some(0))?;
    assert_eq!(xx, yy);

    Ok(())
}

#[test]
fn mtx_round_trip_test() -> anyhow::Result<()> {
    let triplets = vec![(0, 0, 2.0), (0, 2, 1.0), (1, 1, 3.0), (1, 3, 1.0), (2, 3, 4.0)];

    let mtx_file = create_temp_dir_file("mtx.gz")?;
    let mtx_name = mtx_file.to_str().unwrap();
    write_mtx_triplets(&triplets, 3, 4, mtx_name)?;

    let (read_back, shape) = read_mtx_triplets(mtx_name)?;
    assert_eq!(shape, (3, 4, 5));
    assert_eq!(read_back, triplets);

    let csr = CsrMatrix::<f64>::from_nonzero_triplets(shape.0, shape.1, read_back)?;
    assert_eq!(csr.nrows(), 3);
    assert_eq!(csr.ncols(), 4);
    assert_eq!(csr.nnz(), 5);

    let dense = ndarray::Array2::<f64>::from_nonzero_triplets(3, 4, triplets.clone())?;
    assert_eq!(dense[(1, 1)], 3.0);
    assert_eq!(dense[(2, 0)], 0.0);

    let (_, _, back) = dense.to_nonzero_triplets()?;
    assert_eq!(back.len(), 5);

    Ok(())
}

#[test]
fn rgamma_is_reproducible() -> anyhow::Result<()> {
    let xx = ndarray::Array2::<f64>::rgamma(3, 5, (100., 0.01), &mut SmallRng::seed_from_u64(1))?;
    let yy = ndarray::Array2::<f64>::rgamma(3, 5, (100., 0.01), &mut SmallRng::seed_from_u64(1))?;
    assert_eq!(xx, yy);
    assert!(xx.iter().all(|&x| x > 0.0));

    // mean 1 and standard deviation 0.1
    let mean = xx.mean().unwrap();
    approx::assert_abs_diff_eq!(mean, 1.0, epsilon = 0.2);

    assert!(ndarray::Array2::<f64>::rgamma(3, 5, (-1., 0.01), &mut SmallRng::seed_from_u64(1)).is_err());
    Ok(())
}
