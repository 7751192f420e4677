//! Create and manipulate a row-based [`Table`].

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::path::{Path, PathBuf};

/// A row-based [`Table`] of generic data, with named columns.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Table<T> {
    /// Names of the table columns.
    pub headers: Vec<String>,
    /// Rows of table values.
    pub rows: Vec<Vec<T>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T> {
    /// Returns a new row-based [`Table`] with empty headers and rows.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::new();
    /// table.headers = vec!["1".to_string(), "2".to_string()];
    /// table.add_row(["A", "B"])?;
    /// # assert_eq!(table.rows, vec![vec!["A", "B"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Returns a new [`Table`] with the given headers and no rows.
    ///
    /// ## Examples
    ///
    /// ```
    /// let table = ccsp_table::Table::<String>::with_headers(["1", "2", "3"]);
    /// assert_eq!(table.headers, ["1", "2", "3"]);
    /// assert!(table.rows.is_empty());
    /// ```
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table { headers: headers.into_iter().map(Into::into).collect(), rows: Vec::new(), path: None }
    }

    /// Add a new row to the table.
    ///
    /// ## Arguments
    ///
    /// * `row` - An iterable object of new data (`T`) to add as a row.
    ///
    /// The row length must match the number of headers (or, for a table
    /// without headers, the length of the existing rows).
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_row(["D", "E", "F"])?;
    /// assert!(table.add_row(["G"]).is_err());
    /// # assert_eq!(table.rows, [["A", "B", "C"], ["D", "E", "F"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// | 1 | 2 | 3 |
    /// |---|---|---|
    /// | A | B | C |
    /// | D | E | F |
    ///
    pub fn add_row<I>(&mut self, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        let row = row.into_iter().collect_vec();
        let expected = match (self.headers.is_empty(), self.rows.first()) {
            (false, _) => Some(self.headers.len()),
            (true, Some(first)) => Some(first.len()),
            (true, None) => None,
        };
        if let Some(ex) = expected {
            let new = row.len();
            if ex != new {
                return Err(eyre!("New row size ({new}) does not match existing table ({ex})."));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Adds a new column to the [`Table`].
    ///
    /// ## Arguments
    ///
    /// * `header` - Name of the new column.
    /// * `column` - An iterable object of new data (`T`), one value per existing row.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_column("4", vec!["D"])?;
    ///
    /// assert_eq!(table.get_column("4")?, [&"D"]);
    /// assert!(table.add_column("5", vec!["E", "F"]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// | 1 | 2 | 3 | 4 |
    /// |---|---|---|---|
    /// | A | B | C | D |
    pub fn add_column<I>(&mut self, header: &str, column: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        let column = column.into_iter().collect_vec();
        let ex = self.rows.len();
        let new = column.len();

        if ex != new {
            return Err(eyre!("New column size ({new}) does not match existing table ({ex})."));
        }

        self.headers.push(header.to_string());
        self.rows.iter_mut().zip(column).for_each(|(row, val)| row.push(val));
        Ok(())
    }

    /// Returns the [`Table`] value under a particular header and row index.
    ///
    /// ## Arguments
    ///
    /// - `header` - Column name.
    /// - `row` - Row index (0-based).
    ///
    /// # Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    ///
    /// assert_eq!(table.get("2", 0)?, &"B");
    /// assert!(table.get("2", 1).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get(&self, header: &str, row: usize) -> Result<&T, Report> {
        let header_i = self.get_header_index(header)?;
        let row = self.get_row(row)?;
        row.get(header_i).wrap_err_with(|| eyre!("Row is missing a value for column '{header}'."))
    }

    /// Returns a [`Vec`] of [`Table`] values under a header.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2"]);
    /// table.add_row(["A", "B"])?;
    /// table.add_row(["D", "E"])?;
    ///
    /// assert_eq!(table.get_column("1")?, [&"A", &"D"]);
    /// assert_eq!(table.get_column("2")?, [&"B", &"E"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_column(&self, header: &str) -> Result<Vec<&T>, Report> {
        let header_i = self.get_header_index(header)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.get(header_i)
                    .wrap_err_with(|| eyre!("Row ({i}) is missing a value for column '{header}'."))
            })
            .collect()
    }

    /// Returns the column index (0-based) of the header in the [`Table`].
    ///
    /// # Examples
    ///
    /// ```
    /// let table = ccsp_table::Table::<String>::with_headers(["1", "2", "3"]);
    ///
    /// assert_eq!(table.get_header_index("1")?, 0);
    /// assert_eq!(table.get_header_index("3")?, 2);
    /// assert!(table.get_header_index("4").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        let pos = self.headers.iter().position(|h| h == header).ok_or_else(|| {
            eyre!("Column '{header}' was not found in table: {:?}.", self.path)
                .suggestion(format!("Available columns: {}", self.headers.iter().join(", ")))
        })?;

        Ok(pos)
    }

    /// Return a row of [`Table`] values from a row index.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_row(["D", "E", "F"])?;
    ///
    /// assert_eq!(table.get_row(1)?, ["D", "E", "F"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_row(&self, i: usize) -> Result<&[T], Report> {
        self.rows.get(i).map(Vec::as_slice).ok_or_else(|| eyre!("Row ({i}) does not exist in the table."))
    }

    /// Update all values in a row.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.set_row(0, ["AA", "BB", "CC"])?;
    /// assert_eq!(table.get_row(0)?, ["AA", "BB", "CC"]);
    /// assert!(table.set_row(10, ["AA", "BB", "CC"]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn set_row<I>(&mut self, i: usize, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        if i >= self.rows.len() {
            return Err(eyre!("Row ({i}) does not exist in the table."));
        }
        self.rows[i] = row.into_iter().collect();
        Ok(())
    }
}

/// Methods for when the table data can be ordered.
impl<T> Table<T>
where
    T: PartialOrd,
{
    /// Sort rows by the values under each header in turn (stable).
    ///
    /// Values that cannot be compared are treated as equal.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["batch", "cell"]);
    /// table.add_row(["b2", "A"])?;
    /// table.add_row(["b1", "C"])?;
    /// table.add_row(["b1", "B"])?;
    /// table.sort_by_columns(&["batch", "cell"])?;
    ///
    /// assert_eq!(table.get_column("cell")?, [&"B", &"C", &"A"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn sort_by_columns(&mut self, headers: &[&str]) -> Result<(), Report> {
        let indices: Vec<usize> =
            headers.iter().map(|h| self.get_header_index(h)).collect::<Result<_, _>>()?;
        self.rows.sort_by(|a, b| {
            indices
                .iter()
                .map(|&i| a[i].partial_cmp(&b[i]).unwrap_or(Ordering::Equal))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(())
    }
}

impl Table<String> {
    /// Read a delimited text file (TSV or CSV) into a [`Table`].
    ///
    /// The first line is used as headers.
    ///
    /// # Arguments
    ///
    /// * `path` - File path.
    /// * `delim` - Optional delimiter. Otherwise, will be identified based on path suffix (.tsv, .txt, or .csv).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    ///
    /// let mut file = tempfile::Builder::new().suffix(".tsv").tempfile()?;
    /// writeln!(file, "1\t2\t3\nA\tB\tC")?;
    /// let table = ccsp_table::Table::read(file.path(), None)?;
    /// assert_eq!(table.headers, ["1", "2", "3"]);
    /// assert_eq!(table.rows, [["A", "B", "C"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<char>) -> Result<Table<String>, Report>
    where
        P: AsRef<Path> + Debug + ?Sized,
    {
        // if not provided, lookup delimiter from file extension
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delim as u8)
            .has_headers(true)
            .flexible(true)
            .from_path(path.as_ref())
            .wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;

        let headers = reader
            .headers()
            .wrap_err_with(|| eyre!("Failed to read table headers: {path:?}"))?
            .iter()
            .map(String::from)
            .collect_vec();

        let mut table = Table::with_headers(headers);
        for (i, record) in reader.records().enumerate() {
            let record = record.wrap_err_with(|| eyre!("Failed to parse row {i} of {path:?}"))?;
            let mut row = record.iter().map(String::from).collect_vec();
            // pad short rows, so that every header has a value
            row.resize(table.headers.len(), String::new());
            table.add_row(row)?;
        }

        table.path = Some(path.as_ref().to_path_buf());

        Ok(table)
    }
}

/// Methods for when the table data can be displayed.
impl<T> Table<T>
where
    T: Display,
{
    /// Convert table to markdown format.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut table = ccsp_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    ///
    /// let expected = "| 1 | 2 | 3 |\n|---|---|---|\n| A | B | C |\n";
    /// assert_eq!(table.to_markdown()?, expected);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn to_markdown(&self) -> Result<String, Report> {
        // get the maximum width of each column
        let col_widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(col_i, header)| {
                let header_width = header.len();
                self
                    // iterate through this column's rows,
                    // get max string width, +2 to add space on either side
                    .rows
                    .iter()
                    .map(|row| {
                        let cell_width = row.get(col_i).map(|v| v.to_string().len()).unwrap_or(0);
                        cell_width.max(header_width) + 2
                    })
                    .max()
                    .unwrap_or(header_width + 2)
            })
            .collect_vec();

        let mut markdown = String::from("|");
        // frame in between headers and rows
        let mut header_frame = String::from("|");

        // Create the header line
        for (header, col_width) in self.headers.iter().zip(col_widths.iter()) {
            let cell = format!("{:^width$}|", header, width = col_width);
            markdown.push_str(&cell);

            let frame = format!("{}|", "-".repeat(*col_width));
            header_frame.push_str(&frame);
        }
        markdown.push('\n');
        markdown.push_str(&header_frame);
        markdown.push('\n');

        // Create the row lines
        for (row_i, row) in self.rows.iter().enumerate() {
            markdown.push('|');
            for (col_i, col_width) in col_widths.iter().enumerate() {
                let value = row
                    .get(col_i)
                    .wrap_err_with(|| eyre!("Row ({row_i}) is missing column ({col_i})."))?;
                let cell = format!("{:^width$}|", value.to_string(), width = col_width);
                markdown.push_str(&cell);
            }
            markdown.push('\n');
        }

        Ok(markdown)
    }
}

/// Get delimiter based on file extension.
///
/// ## Examples
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// Note that `.txt` is assumed to be tab-delimited!
///
/// ```rust
/// use ccsp_table::get_delimiter;
///
/// assert_eq!(get_delimiter("file.tsv")?, '\t');
/// assert_eq!(get_delimiter("file.csv")?, ',');
/// assert_eq!(get_delimiter("file.txt")?, '\t');
/// assert!(get_delimiter("file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<char, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let ext = path
        .as_ref()
        .extension()
        .wrap_err_with(|| eyre!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| eyre!("Failed to convert file extension to str: {path:?}"))?;
    // convert extension to the expected delimiter
    match ext {
        "tsv" | "txt" => Ok('\t'),
        "csv" => Ok(','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}
