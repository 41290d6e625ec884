mod recovery_tests;
