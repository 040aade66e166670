pub mod csv_statement;
pub mod pdf_text;
