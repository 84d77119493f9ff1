mod capture_run;
mod export_flow;
mod failure_isolation;
