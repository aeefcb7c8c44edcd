pub mod columns;
pub mod deserializers;
pub mod pipeline;
pub mod types;

pub use pipeline::{
    parse_taxonomy_csv, parse_taxonomy_csv_reader, parse_tickets_csv, parse_tickets_csv_reader,
    TaxonomyParseOutput, TicketsParseOutput,
};
pub use types::{CsvImportResult, LegacyTicket, ParseWarning};
