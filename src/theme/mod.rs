pub(crate) mod scheme;
