use crate::common_io::*;
use log::warn;
use rayon::prelude::*;
use std::io::Write;

pub type MtxTriplets = Vec<(u64, u64, f64)>;

/// Write the triplets into a MatrixMarket file with 1-based indices
/// * `triplets` - the triplets to write (0-based)
/// * `nrow` - number of rows
/// * `ncol` - number of columns
/// * `mtx_file` - the output file (e.g., "matrix.mtx.gz")
pub fn write_mtx_triplets(
    triplets: &[(u64, u64, f64)],
    nrow: usize,
    ncol: usize,
    mtx_file: &str,
) -> anyhow::Result<()> {
    mkdir(mtx_file)?;

    let mut buf = open_buf_writer(mtx_file)?;

    let nnz = triplets.len();
    writeln!(buf, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(buf, "{}\t{}\t{}", nrow, ncol, nnz)?;

    for (row, col, val) in triplets {
        writeln!(buf, "{}\t{}\t{}", row + 1, col + 1, val)?;
    }

    buf.flush()?;
    Ok(())
}

/// Read a matrix market file and return a vector of 0-based
/// triplets (row, col, val) sorted by row, then column, along with
/// the `(nrow, ncol, nnz)` shape in the header
/// * `mtx_file` - Path to the matrix market file
pub fn read_mtx_triplets(mtx_file: &str) -> anyhow::Result<(MtxTriplets, (usize, usize, usize))> {
    // the `%%MatrixMarket` banner is a comment line, so the shape
    // comes first after comments are dropped
    let ReadLinesOut { lines, header } = read_lines_of_words(mtx_file, Some(0))?;

    if header.len() != 3 {
        return Err(anyhow::anyhow!("Failed to parse mtx header in {}", mtx_file));
    }

    let nrow = header[0].parse::<usize>()?;
    let ncol = header[1].parse::<usize>()?;
    let nnz = header[2].parse::<usize>()?;

    fn parse_row_col_val(triplet: &[Box<str>]) -> anyhow::Result<(u64, u64, f64)> {
        if triplet.len() != 3 {
            return Err(anyhow::anyhow!("expected a triplet: {:?}", triplet));
        }
        let row = triplet[0].parse::<u64>()?;
        let col = triplet[1].parse::<u64>()?;
        let val = triplet[2].parse::<f64>()?;

        if row == 0 || col == 0 {
            return Err(anyhow::anyhow!("mtx indices are 1-based: {:?}", triplet));
        }

        Ok((row - 1, col - 1, val))
    }

    let mut mtx_triplets = lines
        .par_iter()
        .map(|x| parse_row_col_val(x))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if mtx_triplets.len() != nnz {
        warn!(
            "{}: the header says {} non-zero elements, but found {}",
            mtx_file,
            nnz,
            mtx_triplets.len()
        );
    }

    if let Some(&(r, c, _)) = mtx_triplets
        .iter()
        .find(|&&(r, c, _)| r as usize >= nrow || c as usize >= ncol)
    {
        return Err(anyhow::anyhow!(
            "entry ({}, {}) is outside of {} x {}",
            r + 1,
            c + 1,
            nrow,
            ncol
        ));
    }

    mtx_triplets.par_sort_by_key(|&(row, col, _)| (row, col));
    Ok((mtx_triplets, (nrow, ncol, nnz)))
}
