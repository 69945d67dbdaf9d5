//! different utility modules used throughout the project
/// terminal and file logger setup from a textual log level
pub mod logger;
/// explicitly seeded random generator: starting vectors and generated test systems
pub mod random;
/// descriptive statistics of residual/timing histories (mean, variance, percentiles) and table report
pub mod stats;
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" into HashMap
pub mod task_parser;
/// wall-clock timing of solver phases
pub mod timer;
