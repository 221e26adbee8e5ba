mod helpers;
mod integration_parallel;
