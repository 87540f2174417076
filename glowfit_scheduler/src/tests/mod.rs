mod poller_tests;
mod recurrence_tests;
